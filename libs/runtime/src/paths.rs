use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

/// Resolve the server home directory.
///
/// - `None` or an empty value → `<platform home>/<default_subdir>`
/// - a leading `~` is expanded against the platform home
/// - relative paths are made absolute against the current directory
///
/// With `create` the directory is created if missing.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let raw = configured
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let path = match raw {
        None => platform_home()?.join(default_subdir),
        Some(s) if s == "~" => platform_home()?,
        Some(s) => match s.strip_prefix("~/").or_else(|| s.strip_prefix("~\\")) {
            Some(rest) => platform_home()?.join(rest),
            None => {
                let p = PathBuf::from(&s);
                if p.is_absolute() {
                    p
                } else {
                    std::env::current_dir()
                        .context("current directory is not accessible")?
                        .join(p)
                }
            }
        },
    };

    if create {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("failed to create home dir '{}'", path.display()))?;
    }
    Ok(path)
}

fn platform_home() -> Result<PathBuf> {
    #[cfg(target_os = "windows")]
    let home = dirs::config_dir();
    #[cfg(not(target_os = "windows"))]
    let home = dirs::home_dir();

    home.ok_or_else(|| anyhow!("cannot determine the user home directory"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absolute_path_is_kept_and_created() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("srv/home");

        let resolved =
            resolve_home_dir(Some(target.to_string_lossy().to_string()), ".x", true).unwrap();
        assert_eq!(resolved, target);
        assert!(target.is_dir());
    }

    #[test]
    fn tilde_is_expanded() {
        let resolved = resolve_home_dir(Some("~/.tilde_case".into()), ".x", false).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with(".tilde_case"));
        assert!(!resolved.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn empty_value_uses_default_subdir() {
        let resolved = resolve_home_dir(Some("   ".into()), ".classifieds", false).unwrap();
        assert!(resolved.ends_with(".classifieds"));
    }
}
