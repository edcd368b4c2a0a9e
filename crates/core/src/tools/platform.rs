//! Platform identification and platform-affinity ordering of candidate names.

/// File name suffixes that mark an executable as Windows-style.
pub const WINDOWS_SUFFIXES: &[&str] = &[".exe", ".cmd", ".bat"];

/// The platform tools run on. Only the OS family affects resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: Os,
}

impl Platform {
    /// Create a new platform.
    #[must_use]
    pub const fn new(os: Os) -> Self {
        Self { os }
    }

    /// Get the current platform.
    #[must_use]
    pub fn current() -> Self {
        Self::new(Os::current())
    }

    /// Whether this is a Windows-family platform.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    /// Separator between entries of a PATH-like variable.
    #[must_use]
    pub fn path_list_separator(&self) -> char {
        if self.is_windows() { ';' } else { ':' }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.os, f)
    }
}

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Windows,
    Darwin,
    Linux,
    Other,
}

impl Os {
    /// Get the current OS.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::Darwin
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Other
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Windows => write!(f, "windows"),
            Self::Darwin => write!(f, "darwin"),
            Self::Linux => write!(f, "linux"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Whether `name` carries a Windows-style executable suffix.
#[must_use]
pub fn is_windows_style(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    WINDOWS_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// Reorder candidate names so the platform's native style comes first.
///
/// Windows platforms try `.exe`/`.cmd`/`.bat` names before bare names; every
/// other platform does the reverse. Relative order inside each group is kept.
#[must_use]
pub fn platform_order<'a, S: AsRef<str>>(names: &'a [S], platform: &Platform) -> Vec<&'a str> {
    let (windows, native): (Vec<&str>, Vec<&str>) = names
        .iter()
        .map(AsRef::as_ref)
        .partition(|name| is_windows_style(name));

    if platform.is_windows() {
        windows.into_iter().chain(native).collect()
    } else {
        native.into_iter().chain(windows).collect()
    }
}

/// Split a PATH-like value into its non-empty directory entries.
#[must_use]
pub fn split_path_list(value: &str, platform: &Platform) -> Vec<String> {
    value
        .split(platform.path_list_separator())
        .map(|entry| entry.trim().trim_matches('"'))
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}
