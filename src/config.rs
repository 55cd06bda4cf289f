//! Container universe and host configuration, loaded from `bay.toml` merged
//! with `BAY_`-prefixed environment variables.

use crate::container::{Container, ContainerSet};
use crate::error::{BayError, Result};
use crate::formation::Host;
use figment2::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Deserialize, Debug, Clone)]
pub struct HostConfig {
    pub url: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ContainerConfig {
    pub image: String,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub system: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default)]
    pub hosts: BTreeMap<String, HostConfig>,
    #[serde(default)]
    pub containers: BTreeMap<String, ContainerConfig>,
}

pub fn load_config(config_path: &Path) -> Result<Config> {
    Figment::new()
        .merge(Toml::file(config_path))
        .merge(Env::prefixed("BAY_").split("_"))
        .extract()
        .map_err(|e| BayError::Config(e.to_string()))
}

impl Config {
    /// Turns the configured definitions into a validated arena. Links to
    /// undefined containers are rejected here.
    pub fn container_set(&self) -> Result<ContainerSet> {
        let containers = self
            .containers
            .iter()
            .map(|(name, c)| Container {
                name: name.clone(),
                image: c.image.clone(),
                system: c.system,
                links: c.links.clone(),
            })
            .collect();
        ContainerSet::new(containers)
    }

    /// Hosts not listed in the config fall back to local daemon defaults.
    pub fn host(&self, name: &str) -> Host {
        let url = self.hosts.get(name).and_then(|h| h.url.clone());
        Host::new(name, url)
    }
}

#[test]
fn test_load_config() {
    use figment2::Jail;
    Jail::expect_with(|jail: &mut Jail| {
        jail.create_file(
            "bay-test.toml",
            r#"
            [hosts.staging]
            url = "http://getsoverridden:1111"

            [containers.web]
            image = "web:latest"
            links = ["db"]

            [containers.db]
            image = "db:latest"

            [containers.proxy]
            image = "proxy:latest"
            system = true
            "#,
        )?;

        jail.set_env("BAY_hosts_staging_url", "http://staging-daemon:2375");

        let config = load_config("bay-test.toml".as_ref()).unwrap();

        assert_eq!(
            config.hosts.get("staging").unwrap().url.as_deref(),
            Some("http://staging-daemon:2375")
        );
        assert_eq!(config.containers["web"].links, vec!["db".to_string()]);
        assert!(config.containers["proxy"].system);
        assert!(!config.containers["db"].system);

        let set = config.container_set().unwrap();
        assert!(set.id_of("web").is_ok());
        assert!(set.id_of("ghost").is_err());

        let host = config.host("staging");
        assert_eq!(host.url(), Some("http://staging-daemon:2375"));
        assert_eq!(config.host("default").url(), None);

        Ok(())
    });
}
