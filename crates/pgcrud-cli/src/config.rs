use pgcrud::DbConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default migrations directory, relative to the config file.
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_dir: PathBuf,
    pub file: ConfigFile,
}

impl ProjectConfig {
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        let config_dir = config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let raw = std::fs::read_to_string(config_path).map_err(|e| {
            anyhow::anyhow!("failed to read config file {}: {e}", config_path.display())
        })?;

        let file = ConfigFile::parse(&raw).map_err(|e| {
            anyhow::anyhow!("invalid config file {}: {e:#}", config_path.display())
        })?;

        Ok(Self { config_dir, file })
    }

    /// Load `config_path` when it exists, otherwise fall back to defaults rooted at `.`.
    pub fn load_or_default(config_path: &Path) -> anyhow::Result<Self> {
        if config_path.exists() {
            Self::load(config_path)
        } else {
            Ok(Self {
                config_dir: PathBuf::from("."),
                file: ConfigFile::default(),
            })
        }
    }

    pub fn resolve_path(&self, p: impl AsRef<Path>) -> PathBuf {
        let p = p.as_ref();
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.config_dir.join(p)
        }
    }

    /// Migrations directory: the flag wins over the config file.
    pub fn migrations_dir(&self, flag: Option<&Path>) -> PathBuf {
        match flag {
            Some(dir) => dir.to_path_buf(),
            None => self.resolve_path(&self.file.migrations.dir),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub migrations: MigrationsSection,
}

/// `[database]`: either a `url` or discrete fields, plus pool and tracking-table settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSection {
    pub url: Option<String>,
    #[serde(flatten)]
    pub config: DbConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MigrationsSection {
    pub dir: String,
    /// Run each migration inside a transaction.
    pub transactional: bool,
}

impl Default for MigrationsSection {
    fn default() -> Self {
        Self {
            dir: DEFAULT_MIGRATIONS_DIR.to_string(),
            transactional: true,
        }
    }
}

impl ConfigFile {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let mut file: ConfigFile = toml::from_str(raw)?;
        file.expand_env()?;
        file.validate()?;
        Ok(file)
    }

    fn expand_env(&mut self) -> anyhow::Result<()> {
        if let Some(url) = self.database.url.as_mut() {
            *url = expand_env_vars(url)?;
        }

        let db = &mut self.database.config;
        db.host = expand_env_vars(&db.host)?;
        db.user = expand_env_vars(&db.user)?;
        db.password = expand_env_vars(&db.password)?;
        db.database = expand_env_vars(&db.database)?;

        self.migrations.dir = expand_env_vars(&self.migrations.dir)?;
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if let Some(url) = &self.database.url {
            if url.trim().is_empty() {
                anyhow::bail!("database.url must not be empty when set");
            }
        }
        if self.migrations.dir.trim().is_empty() {
            anyhow::bail!("migrations.dir must not be empty");
        }
        self.database.config.validate()?;
        Ok(())
    }

    /// Connection string: `--database-url` first, then `database.url`, then the discrete fields.
    pub fn dsn(&self, override_url: Option<&str>) -> anyhow::Result<String> {
        Ok(match (override_url, &self.database.url) {
            (Some(url), _) => url.to_string(),
            (None, Some(url)) => url.clone(),
            (None, None) => self.database.config.dsn()?,
        })
    }
}

fn expand_env_vars(input: &str) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                anyhow::bail!("unterminated env var reference: ${{{key}");
            }
            if key.is_empty() {
                anyhow::bail!("invalid env var reference: ${{}}");
            }

            let v = std::env::var(&key)
                .map_err(|_| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file_content() {
        let file = ConfigFile::parse("").expect("parse");
        assert_eq!(file.migrations.dir, "migrations");
        assert!(file.migrations.transactional);
        assert_eq!(file.database.config.migrations_table, "schema_migrations");
        assert_eq!(
            file.dsn(None).expect("dsn"),
            "postgres://postgres@localhost:5432/postgres?sslmode=disable"
        );
    }

    #[test]
    fn discrete_fields_and_tracking_table() {
        let file = ConfigFile::parse(
            r#"
[database]
host = "db"
port = 6543
user = "todo"
database = "todo"
migrations_table = "todo_migrations"
max_connections = 4

[migrations]
dir = "db/migrations"
transactional = false
"#,
        )
        .expect("parse");

        assert_eq!(file.database.config.port, 6543);
        assert_eq!(file.database.config.max_connections, 4);
        assert_eq!(file.database.config.migrations_table, "todo_migrations");
        assert_eq!(file.migrations.dir, "db/migrations");
        assert!(!file.migrations.transactional);
        assert_eq!(
            file.dsn(None).expect("dsn"),
            "postgres://todo@db:6543/todo?sslmode=disable"
        );
    }

    #[test]
    fn url_and_override_precedence() {
        let file = ConfigFile::parse(
            r#"
[database]
url = "postgres://from-file/app"
"#,
        )
        .expect("parse");

        assert_eq!(file.dsn(None).expect("dsn"), "postgres://from-file/app");
        assert_eq!(
            file.dsn(Some("postgres://from-flag/app")).expect("dsn"),
            "postgres://from-flag/app"
        );
    }

    #[test]
    fn rejects_invalid_tracking_table() {
        let err = ConfigFile::parse(
            r#"
[database]
migrations_table = "drop table"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid identifier"));
    }

    #[test]
    fn rejects_unknown_section() {
        assert!(ConfigFile::parse("[packages]\nname = \"x\"\n").is_err());
    }

    #[test]
    fn expand_env_vars_replaces_known_keys() {
        let path = std::env::var("PATH").expect("PATH is set");
        assert_eq!(expand_env_vars("a${PATH}b").expect("expand"), format!("a{path}b"));
        assert_eq!(expand_env_vars("no vars").expect("expand"), "no vars");
    }

    #[test]
    fn expand_env_vars_reports_errors() {
        assert!(expand_env_vars("${PGCRUD_SURELY_MISSING_VAR}").is_err());
        assert!(expand_env_vars("${UNTERMINATED").is_err());
        assert!(expand_env_vars("${}").is_err());
    }

    #[test]
    fn migrations_dir_resolves_against_config_dir() {
        let cfg = ProjectConfig {
            config_dir: PathBuf::from("/srv/app"),
            file: ConfigFile::default(),
        };
        assert_eq!(cfg.migrations_dir(None), PathBuf::from("/srv/app/migrations"));
        assert_eq!(
            cfg.migrations_dir(Some(Path::new("other"))),
            PathBuf::from("other")
        );
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pgcrud.toml");
        std::fs::write(&path, "[migrations]\ndir = \"sql\"\n").expect("write");

        let cfg = ProjectConfig::load(&path).expect("load");
        assert_eq!(cfg.migrations_dir(None), dir.path().join("sql"));
    }
}
