use anyhow::{anyhow, Context, Result};
use std::collections::{HashMap, HashSet};
use std::env;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// File name looked up from the working directory upwards and in $HOME
pub const PROJECT_CONFIG_NAME: &str = ".logmergerc";

const MAX_ALIAS_DEPTH: usize = 10;

/// `.logmergerc` contents: argument defaults and named argument aliases
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConfigFile {
    pub defaults: Option<String>,
    pub aliases: HashMap<String, String>,
}

impl ConfigFile {
    /// Walk up from the working directory looking for `.logmergerc`
    pub fn find_project_config() -> Option<PathBuf> {
        let mut current = env::current_dir().ok()?;
        loop {
            let config_path = current.join(PROJECT_CONFIG_NAME);
            if config_path.is_file() {
                return Some(config_path);
            }
            if !current.pop() {
                break;
            }
        }
        None
    }

    /// User-level locations in order of preference
    pub fn get_user_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if cfg!(windows) {
            if let Ok(appdata) = env::var("APPDATA") {
                paths.push(PathBuf::from(appdata).join("logmerge").join("config.ini"));
            }
            if let Ok(userprofile) = env::var("USERPROFILE") {
                paths.push(PathBuf::from(userprofile).join(PROJECT_CONFIG_NAME));
            }
        } else {
            let xdg_config = env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    env::var("HOME")
                        .map(|h| PathBuf::from(h).join(".config"))
                        .unwrap_or_else(|_| PathBuf::from(".config"))
                });
            paths.push(xdg_config.join("logmerge").join("config.ini"));

            if let Ok(home) = env::var("HOME") {
                paths.push(PathBuf::from(home).join(PROJECT_CONFIG_NAME));
            }
        }

        paths
    }

    /// Load the first user config, then overlay the project config
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(user_path) = Self::get_user_config_paths().into_iter().find(|p| p.is_file()) {
            config = Self::merge_configs(config, Self::load_from_path(&user_path)?);
        }

        if let Some(project_path) = Self::find_project_config() {
            config = Self::merge_configs(config, Self::load_from_path(&project_path)?);
        }

        Ok(config)
    }

    /// Load from `--config-file` when given, else from the standard locations
    pub fn load_with_custom_path(custom_path: Option<&str>) -> Result<Self> {
        match custom_path {
            Some(path) => Self::load_from_path(Path::new(path)),
            None => Self::load(),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Ok(Self::parse_ini_content(&content))
    }

    /// Parse the INI subset: root-level `defaults = ...` and an `[aliases]`
    /// section. Unknown keys and sections are ignored.
    pub fn parse_ini_content(content: &str) -> Self {
        let mut defaults = None;
        let mut aliases = HashMap::new();
        let mut current_section = String::new();

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current_section = line[1..line.len() - 1].trim().to_string();
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());

            match current_section.as_str() {
                "" if key == "defaults" => defaults = Some(value.to_string()),
                "aliases" => {
                    aliases.insert(key.to_string(), value.to_string());
                }
                _ => {}
            }
        }

        Self { defaults, aliases }
    }

    /// Overlay wins for defaults and for aliases with the same name
    fn merge_configs(base: Self, overlay: Self) -> Self {
        let mut aliases = base.aliases;
        aliases.extend(overlay.aliases);
        Self {
            defaults: overlay.defaults.or(base.defaults),
            aliases,
        }
    }

    /// Human-readable report for `--show-config`
    pub fn render_config_report(custom_path: Option<&str>) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Configuration precedence: CLI > project {} > user config > defaults\n",
            PROJECT_CONFIG_NAME
        );

        let project_config_path = Self::find_project_config();
        let user_config_paths = Self::get_user_config_paths();
        let user_config_path = user_config_paths.iter().find(|p| p.is_file());

        match Self::load_with_custom_path(custom_path) {
            Ok(config) => {
                let mut loaded_from = Vec::new();
                if let Some(path) = custom_path {
                    loaded_from.push(format!("Custom: {}", path));
                } else {
                    if let Some(path) = &project_config_path {
                        loaded_from.push(format!("Project: {}", path.display()));
                    }
                    if let Some(path) = user_config_path {
                        loaded_from.push(format!("User: {}", path.display()));
                    }
                }

                if loaded_from.is_empty() {
                    let _ = writeln!(out, "No configuration files found. Using defaults.");
                } else {
                    let _ = writeln!(out, "Configuration loaded from:");
                    for source in loaded_from {
                        let _ = writeln!(out, "  {}", source);
                    }
                }

                if let Some(defaults) = &config.defaults {
                    let _ = writeln!(out, "\nActive defaults:\n  defaults = {}", defaults);
                }

                if !config.aliases.is_empty() {
                    let _ = writeln!(out, "\nActive aliases:");
                    let mut sorted: Vec<_> = config.aliases.iter().collect();
                    sorted.sort_by_key(|(name, _)| name.as_str());
                    for (name, value) in sorted {
                        let _ = writeln!(out, "  {} = {}", name, value);
                    }
                }
            }
            Err(e) => {
                let _ = writeln!(out, "Error loading configuration: {:#}", e);
            }
        }

        let _ = writeln!(out, "\nConfiguration search locations (in precedence order):");
        match &project_config_path {
            Some(path) => {
                let _ = writeln!(out, "  1. Project: {} (found)", path.display());
            }
            None => {
                let _ = writeln!(
                    out,
                    "  1. Project: {} (searched up directory tree, not found)",
                    PROJECT_CONFIG_NAME
                );
            }
        }
        for (i, path) in user_config_paths.iter().enumerate() {
            let status = if path.is_file() { "(found)" } else { "(not found)" };
            let _ = writeln!(out, "  {}. User: {} {}", i + 2, path.display(), status);
        }

        if custom_path.is_none() && project_config_path.is_none() && user_config_path.is_none() {
            let _ = writeln!(out, "\nExample configuration file ({}):\n", PROJECT_CONFIG_NAME);
            let _ = writeln!(out, "# Arguments applied to every logmerge command");
            let _ = writeln!(out, "defaults = --stats");
            let _ = writeln!(out);
            let _ = writeln!(out, "[aliases]");
            let _ = writeln!(out, "json = --output-format json --no-color");
            let _ = writeln!(out, "peek = --take 20");
        }

        out
    }

    /// Expand one alias, following nested `-a NAME` / `--alias NAME` references
    pub fn resolve_alias(
        &self,
        name: &str,
        seen: &mut HashSet<String>,
        depth: usize,
    ) -> Result<Vec<String>> {
        if depth > MAX_ALIAS_DEPTH {
            return Err(anyhow!("Alias chain too deep: {} levels", depth));
        }
        if seen.contains(name) {
            return Err(anyhow!("Circular dependency detected in alias: {}", name));
        }

        let alias_value = self
            .aliases
            .get(name)
            .ok_or_else(|| anyhow!("Unknown alias: {}", name))?;
        let args = shell_words::split(alias_value)
            .with_context(|| format!("Invalid alias '{}': failed to parse arguments", name))?;

        seen.insert(name.to_string());
        let result = self.expand_aliases(args, seen, depth + 1);
        seen.remove(name);
        result
    }

    fn expand_aliases(
        &self,
        args: Vec<String>,
        seen: &mut HashSet<String>,
        depth: usize,
    ) -> Result<Vec<String>> {
        let mut result = Vec::with_capacity(args.len());
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            if arg == "-a" || arg == "--alias" {
                match iter.next() {
                    Some(name) => result.extend(self.resolve_alias(&name, seen, depth)?),
                    None => result.push(arg),
                }
            } else {
                result.push(arg);
            }
        }
        Ok(result)
    }

    /// Insert `defaults` after the program name, then expand aliases
    pub fn process_args(&self, args: Vec<String>) -> Result<Vec<String>> {
        let args = match &self.defaults {
            Some(defaults) => {
                let default_args = shell_words::split(defaults)
                    .context("Invalid defaults: failed to parse arguments")?;
                let mut args = args.into_iter();
                let mut result: Vec<String> = args.next().into_iter().collect();
                result.extend(default_args);
                result.extend(args);
                result
            }
            None => args,
        };

        self.expand_aliases(args, &mut HashSet::new(), 0)
    }
}
