use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::core::seat_id::{SectionLayout, SectionRule};

// Top-level configuration container
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub seating: SeatingConfig,
    pub admin: AdminSeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in_hours: i64,
}

// Section letters and guaranteed minimum capacities
#[derive(Debug, Clone, Deserialize)]
pub struct SeatingConfig {
    pub sections: Vec<SectionRule>,
}

// Default admin seeded at first startup
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeedConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .expect("PORT must be a valid number"),
                environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "seat_system=debug,tower_http=debug".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
                pool_size: env::var("DB_POOL_SIZE")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .expect("DB_POOL_SIZE must be a valid number"),
                acquire_timeout_secs: env::var("DB_ACQUIRE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .expect("DB_ACQUIRE_TIMEOUT_SECS must be a valid number"),
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
                expires_in_hours: env::var("JWT_EXPIRES_IN_HOURS")
                    .unwrap_or_else(|_| "24".to_string())
                    .parse()
                    .expect("JWT_EXPIRES_IN_HOURS must be a valid number"),
            },
            seating: SeatingConfig {
                sections: parse_sections(
                    &env::var("SEAT_SECTIONS").unwrap_or_else(|_| "A:66,B:39".to_string()),
                ),
            },
            admin: AdminSeedConfig {
                username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
                email: env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@admin.com".to_string()),
                password: env::var("ADMIN_PASSWORD").expect("ADMIN_PASSWORD must be set"),
            },
        }
    }
}

impl SeatingConfig {
    pub fn layout(&self) -> SectionLayout {
        SectionLayout::new(self.sections.clone())
    }
}

// "A:66,B:39" -> section A min 66, section B min 39, both open-ended
fn parse_sections(spec: &str) -> Vec<SectionRule> {
    spec.split(',')
        .map(|part| {
            let (letter, min) = part
                .trim()
                .split_once(':')
                .expect("SEAT_SECTIONS entries must look like A:66");
            SectionRule {
                letter: letter
                    .chars()
                    .next()
                    .filter(|c| c.is_ascii_uppercase() && letter.len() == 1)
                    .expect("SEAT_SECTIONS letters must be single uppercase characters"),
                min_capacity: min
                    .trim()
                    .parse()
                    .expect("SEAT_SECTIONS capacities must be valid numbers"),
                ceiling: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_section_spec() {
        let rules = parse_sections("A:66, B:39");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].letter, 'A');
        assert_eq!(rules[0].min_capacity, 66);
        assert_eq!(rules[1].letter, 'B');
        assert_eq!(rules[1].min_capacity, 39);
    }

    #[test]
    fn acquire_timeout_comes_from_config() {
        let cfg = DatabaseConfig {
            url: "postgres://localhost/seats".to_string(),
            pool_size: 5,
            acquire_timeout_secs: 7,
        };
        assert_eq!(cfg.acquire_timeout(), Duration::from_secs(7));
    }
}
