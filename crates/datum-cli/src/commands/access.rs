//! Access command - evaluate the configured policy.

use anyhow::{Result, bail};
use datum_access::{Action, Resource};
use datum_config::ResolvedConfig;
use datum_core::Profile;

use crate::config_bridge;
use crate::theme::Theme;

/// Decide whether a profile may perform an action on a resource.
///
/// With `access.enforce` set a denial is reported as an error.
pub(crate) fn check_access(
    resolved: &ResolvedConfig,
    subject_id: &str,
    username: &str,
    resource: &str,
    action: &str,
) -> Result<()> {
    let policy = config_bridge::load_policy(resolved)?;
    let resource = Resource::parse(resource)?;
    let action = Action::parse(action)?;
    let profile = Profile::new(subject_id, username);

    let decision = policy.decide(&profile, &resource, &action);
    if decision.is_allowed() {
        println!("{}", Theme::success(&format!("{profile} may {action} {resource}")));
        return Ok(());
    }

    let why = if decision.matched {
        "denied by rule"
    } else {
        "no rule applies"
    };
    println!(
        "{}",
        Theme::denied(&format!("{profile} may not {action} {resource} ({why})"))
    );
    if resolved.config.access.enforce {
        bail!("access denied");
    }
    Ok(())
}

/// Print the effective policy as JSON.
pub(crate) fn show_policy(resolved: &ResolvedConfig) -> Result<()> {
    let policy = config_bridge::load_policy(resolved)?;
    if resolved.config.access.policy_path.is_none() {
        eprintln!("{}", Theme::info("No policy configured; showing the default policy."));
    }
    println!("{}", policy.to_json()?);
    Ok(())
}
