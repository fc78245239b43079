//! Installation plan and the defaults offered while collecting it.

use crate::ui::prompt::{ask_password, ask_with_default, Prompter};
use crate::ui::confirm::is_affirmative;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Defaults shown for each free-text prompt.
///
/// Built-in values can be overridden by a TOML plan file. Passwords are not
/// part of this type, so they can never come from disk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlanDefaults {
    pub disk: String,
    pub timezone: String,
    pub locale: String,
    pub keymap: String,
    pub hostname: String,
    pub username: String,
}

impl Default for PlanDefaults {
    fn default() -> Self {
        Self {
            disk: "/dev/nvme0n1".to_string(),
            timezone: "UTC".to_string(),
            locale: "en_US.UTF-8".to_string(),
            keymap: "us".to_string(),
            hostname: "archlinux".to_string(),
            username: "user".to_string(),
        }
    }
}

impl PlanDefaults {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse plan file")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid plan file {}", path.display()))
    }

    /// Built-in defaults, or the plan file when one is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Everything the pipeline needs, collected once and never written to disk.
#[derive(Clone, PartialEq, Eq)]
pub struct InstallPlan {
    pub disk: String,
    pub timezone: String,
    pub locale: String,
    pub keymap: String,
    pub hostname: String,
    pub username: String,
    pub root_password: String,
    pub user_password: String,
    pub extended: bool,
}

impl fmt::Debug for InstallPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallPlan")
            .field("disk", &self.disk)
            .field("timezone", &self.timezone)
            .field("locale", &self.locale)
            .field("keymap", &self.keymap)
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("root_password", &"<redacted>")
            .field("user_password", &"<redacted>")
            .field("extended", &self.extended)
            .finish()
    }
}

impl InstallPlan {
    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            format!("Disk:      {}", self.disk),
            format!("Timezone:  {}", self.timezone),
            format!("Locale:    {}", self.locale),
            format!("Keymap:    {}", self.keymap),
            format!("Hostname:  {}", self.hostname),
            format!("Username:  {}", self.username),
            format!(
                "Desktop:   {}",
                if self.extended {
                    "Hyprland + user environment"
                } else {
                    "base system only"
                }
            ),
        ]
    }
}

pub const EXTENDED_PROMPT: &str = "Install the Hyprland desktop and user environment? (y/N)";

/// Ask every plan question in order. No value is validated.
pub fn collect_plan(prompter: &mut dyn Prompter, defaults: &PlanDefaults) -> Result<InstallPlan> {
    let disk = ask_with_default(prompter, "Target disk", &defaults.disk)?;
    let timezone = ask_with_default(prompter, "Timezone", &defaults.timezone)?;
    let locale = ask_with_default(prompter, "Locale", &defaults.locale)?;
    let keymap = ask_with_default(prompter, "Console keymap", &defaults.keymap)?;
    let hostname = ask_with_default(prompter, "Hostname", &defaults.hostname)?;
    let username = ask_with_default(prompter, "Username", &defaults.username)?;
    let root_password = ask_password(prompter, "Root password")?;
    let user_password = ask_password(prompter, &format!("Password for {username}"))?;
    let extended = is_affirmative(&prompter.answer(EXTENDED_PROMPT)?);

    Ok(InstallPlan {
        disk,
        timezone,
        locale,
        keymap,
        hostname,
        username,
        root_password,
        user_password,
        extended,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn plan_file_overrides_only_given_fields() {
        let defaults = PlanDefaults::from_toml(
            r#"
disk = "/dev/sda"
hostname = "forge"
"#,
        )
        .unwrap();

        assert_eq!(defaults.disk, "/dev/sda");
        assert_eq!(defaults.hostname, "forge");
        assert_eq!(defaults.timezone, "UTC");
        assert_eq!(defaults.username, "user");
    }

    #[test]
    fn plan_file_rejects_passwords() {
        let err = PlanDefaults::from_toml("root_password = \"hunter2\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("root_password"));
    }

    #[test]
    fn load_reads_plan_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timezone = \"Europe/London\"").unwrap();

        let defaults = PlanDefaults::load_or_default(Some(file.path())).unwrap();
        assert_eq!(defaults.timezone, "Europe/London");
        assert_eq!(
            PlanDefaults::load_or_default(None).unwrap(),
            PlanDefaults::default()
        );
    }

    #[test]
    fn debug_output_redacts_passwords() {
        let plan = InstallPlan {
            disk: "/dev/sda".into(),
            timezone: "UTC".into(),
            locale: "en_US.UTF-8".into(),
            keymap: "us".into(),
            hostname: "forge".into(),
            username: "ada".into(),
            root_password: "rootsecret".into(),
            user_password: "usersecret".into(),
            extended: false,
        };
        let debug = format!("{plan:?}");
        assert!(!debug.contains("rootsecret"));
        assert!(!debug.contains("usersecret"));
        assert!(debug.contains("<redacted>"));
    }
}
