use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portal {
    pub url: String,
    pub token: String,
    pub require_https: bool,
    pub timeout_secs: u64,
}

impl Default for Portal {
    fn default() -> Self {
        Self {
            url: "https://dashboard.esports.example.com".to_string(),
            token: String::new(),
            require_https: true,
            timeout_secs: 10,
        }
    }
}

impl Portal {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn token(&self) -> Option<&str> {
        if self.token.is_empty() {
            None
        } else {
            Some(&self.token)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sidebar {
    pub cache_ttl_secs: u64,
    pub is_admin: bool,
    /// Where the session state is kept, the platform data directory when unset
    pub session_file: Option<PathBuf>,
}

impl Default for Sidebar {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 30,
            is_admin: false,
            session_file: None,
        }
    }
}

impl Sidebar {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub portal: Portal,
    pub sidebar: Sidebar,
}

#[cfg(test)]
mod test {
    use super::*;
    use indoc::indoc;

    const PORTAL_STRING: &str = indoc!(
        r#"url = "http://localhost:5000"
        token = ""
        require_https = false
        timeout_secs = 3
        "#
    );

    const SIDEBAR_STRING: &str = indoc!(
        r#"cache_ttl_secs = 15
        is_admin = true
        session_file = "/tmp/sidebar-session.json"
        "#
    );

    #[test]
    fn test_ser_portal() {
        let p: Portal = Default::default();
        let serialized = toml::to_string(&p).unwrap();
        let deser = toml::from_str(&serialized);
        assert_eq!(deser, Ok(p));
    }

    #[test]
    fn test_ser_sidebar() {
        let s: Sidebar = Default::default();
        let serialized = toml::to_string(&s).unwrap();
        let deser = toml::from_str(&serialized);
        assert_eq!(deser, Ok(s));
    }

    #[test]
    fn test_ser_config() {
        let config: Config = Default::default();
        let serialized = toml::to_string(&config).unwrap();
        let deser = toml::from_str(&serialized);
        assert_eq!(deser, Ok(config));
    }

    #[test]
    fn test_deser_portal() {
        let p: Portal = toml::from_str(PORTAL_STRING).unwrap();
        assert_eq!(p.url, "http://localhost:5000");
        assert_eq!(p.token(), None);
        assert!(!p.require_https);
        assert_eq!(p.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_deser_sidebar() {
        let s: Sidebar = toml::from_str(SIDEBAR_STRING).unwrap();
        assert_eq!(s.cache_ttl(), Duration::from_secs(15));
        assert!(s.is_admin);
        assert_eq!(
            s.session_file,
            Some(PathBuf::from("/tmp/sidebar-session.json"))
        );
    }
}
