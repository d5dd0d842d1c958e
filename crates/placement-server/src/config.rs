use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{Context, bail};
use chrono::Duration;
use tracing::{info, warn};

const DEV_SECRET: &str = "dev-secret-change-me";

/// Initial admin account, created on startup if the username is free.
pub struct AdminSeed {
    pub username: String,
    pub password: String,
    pub email: String,
}

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub admin: Option<AdminSeed>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = lookup("PLACEMENT_JWT_SECRET").unwrap_or_else(|| {
            warn!("PLACEMENT_JWT_SECRET not set, using an insecure development secret");
            DEV_SECRET.into()
        });

        let ttl_hours: i64 = parse_or(&lookup, "PLACEMENT_TOKEN_TTL_HOURS", "720")?;
        if ttl_hours <= 0 {
            bail!("PLACEMENT_TOKEN_TTL_HOURS must be positive, got {ttl_hours}");
        }

        let admin = match (
            lookup("PLACEMENT_ADMIN_USERNAME"),
            lookup("PLACEMENT_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(AdminSeed {
                email: lookup("PLACEMENT_ADMIN_EMAIL")
                    .unwrap_or_else(|| format!("{username}@localhost")),
                username,
                password,
            }),
            (None, None) => None,
            _ => bail!("PLACEMENT_ADMIN_USERNAME and PLACEMENT_ADMIN_PASSWORD must be set together"),
        };

        Ok(Self {
            host: lookup("PLACEMENT_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "PLACEMENT_PORT", "3000")?,
            db_path: PathBuf::from(
                lookup("PLACEMENT_DB_PATH").unwrap_or_else(|| "placement.db".into()),
            ),
            jwt_secret,
            token_ttl: Duration::hours(ttl_hours),
            admin,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e: T::Err| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value '{raw}'"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.db_path, PathBuf::from("placement.db"));
        assert_eq!(cfg.jwt_secret, DEV_SECRET);
        assert_eq!(cfg.token_ttl, Duration::hours(720));
        assert!(cfg.admin.is_none());
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(config(&[("PLACEMENT_PORT", "http")]).is_err());
        assert!(config(&[("PLACEMENT_TOKEN_TTL_HOURS", "0")]).is_err());
    }

    #[test]
    fn admin_seed_needs_both_credentials() {
        assert!(config(&[("PLACEMENT_ADMIN_USERNAME", "root")]).is_err());

        let cfg = config(&[
            ("PLACEMENT_ADMIN_USERNAME", "root"),
            ("PLACEMENT_ADMIN_PASSWORD", "admin-password"),
        ])
        .unwrap();
        let admin = cfg.admin.unwrap();
        assert_eq!(admin.username, "root");
        assert_eq!(admin.email, "root@localhost");
    }
}
