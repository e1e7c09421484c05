use snail_core::{JsRuntime, PatchError, PlatformProfile, Result};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeProbe {
    pub runtime: Option<JsRuntime>,
}

impl RuntimeProbe {
    pub fn found(&self) -> bool {
        self.runtime.is_some()
    }

    pub fn require(self) -> Result<JsRuntime> {
        self.runtime.ok_or(PatchError::MissingRuntime)
    }
}

pub fn is_on_search_path(name: &str) -> bool {
    which::which(name).is_ok()
}

pub fn probe_runtime(profile: &PlatformProfile) -> RuntimeProbe {
    probe_runtime_with(profile, is_on_search_path)
}

/// Bun wins over npm when both are installed.
pub fn probe_runtime_with<Lookup>(profile: &PlatformProfile, lookup: Lookup) -> RuntimeProbe
where
    Lookup: Fn(&str) -> bool,
{
    let runtime = JsRuntime::PREFERENCE.into_iter().find(|runtime| {
        let name = profile.runtime_probe_name(*runtime);
        let present = lookup(name);
        debug!(candidate = name, present, "probing package runner");
        present
    });
    RuntimeProbe { runtime }
}
