//! Settings state owned by the session.

use eslink_core::{RuleOverrides, Settings, disabled_rules};

/// The current settings plus the values derived from them.
///
/// Derived values are rebuilt by [`SettingsState::update`] only, so building
/// a job never recomputes them. Jobs take clones; an update never reaches a
/// job that was already built.
#[derive(Debug, Clone)]
pub struct SettingsState {
    settings: Settings,
    scopes: Vec<String>,
    silenced_while_typing: RuleOverrides,
    disabled_while_fixing: RuleOverrides,
}

impl SettingsState {
    pub fn new(settings: Settings) -> Self {
        let mut state = Self {
            settings: Settings::default(),
            scopes: Vec::new(),
            silenced_while_typing: RuleOverrides::new(),
            disabled_while_fixing: RuleOverrides::new(),
        };
        state.update(settings);
        state
    }

    /// Replaces the settings and recomputes everything derived from them.
    pub fn update(&mut self, settings: Settings) {
        self.scopes = settings.effective_scopes();
        self.silenced_while_typing = disabled_rules(&settings.rules_to_silence_while_typing);
        self.disabled_while_fixing = disabled_rules(&settings.rules_to_disable_while_fixing);
        self.settings = settings;
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Scopes the linter applies to.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Overrides for lint jobs on modified documents.
    pub fn silenced_while_typing(&self) -> &RuleOverrides {
        &self.silenced_while_typing
    }

    /// Overrides for fix jobs.
    pub fn disabled_while_fixing(&self) -> &RuleOverrides {
        &self.disabled_while_fixing
    }
}

impl Default for SettingsState {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
