// File: cbpoller-server/src/config.rs
//
// Layered settings: YAML file < .env / process environment < CLI flags.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use cbpoller_core::handlers::{HandlerKind, DEFAULT_MEASUREMENT};
use cbpoller_core::sink::InfluxSettings;
use cbpoller_core::{ClientConfig, Environment, Error};

use crate::cli::Args;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InfluxFileConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    pub org: Option<String>,
    pub bucket: Option<String>,
    pub measurement: Option<String>,
}

/// Shape of the YAML settings file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub username: Option<String>,
    pub token: Option<String>,
    pub timeout: Option<i64>,
    pub testbed: Option<bool>,
    /// Overrides both production and testbed hosts.
    pub base_url: Option<String>,
    pub handler: Option<String>,
    pub log_format: Option<LogFormat>,
    pub verbose: Option<bool>,
    pub influxdb: InfluxFileConfig,
}

impl FileConfig {
    pub fn from_yaml(text: &str) -> Result<Self, Error> {
        serde_yaml::from_str(text).map_err(|e| Error::Config(format!("invalid settings file: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Unresolved settings; later sources overwrite earlier ones field by field.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub username: Option<String>,
    pub token: Option<String>,
    pub timeout: Option<i64>,
    pub testbed: bool,
    pub base_url: Option<String>,
    pub handler: Option<String>,
    pub verbose: bool,
    pub log_format: LogFormat,
    pub influx_url: Option<String>,
    pub influx_token: Option<String>,
    pub influx_org: Option<String>,
    pub influx_bucket: Option<String>,
    pub influx_measurement: Option<String>,
}

/// Everything `main` needs to start polling.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub client: ClientConfig,
    pub handler: HandlerKind,
    pub influx: Option<InfluxSettings>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, Error> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(Error::Config(format!("{name} must be a boolean, got '{other}'"))),
    }
}

impl Settings {
    pub fn merge_file(mut self, file: FileConfig) -> Self {
        self.username = non_empty(file.username).or(self.username);
        self.token = non_empty(file.token).or(self.token);
        self.timeout = file.timeout.or(self.timeout);
        self.testbed = file.testbed.unwrap_or(self.testbed);
        self.base_url = non_empty(file.base_url).or(self.base_url);
        self.handler = non_empty(file.handler).or(self.handler);
        self.log_format = file.log_format.unwrap_or(self.log_format);
        self.verbose = file.verbose.unwrap_or(self.verbose);
        self.influx_url = non_empty(file.influxdb.url).or(self.influx_url);
        self.influx_token = non_empty(file.influxdb.token).or(self.influx_token);
        self.influx_org = non_empty(file.influxdb.org).or(self.influx_org);
        self.influx_bucket = non_empty(file.influxdb.bucket).or(self.influx_bucket);
        self.influx_measurement = non_empty(file.influxdb.measurement).or(self.influx_measurement);
        self
    }

    /// `lookup` is `std::env::var` in the binary; tests pass a map.
    pub fn merge_env<F>(mut self, lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| non_empty(lookup(name));

        self.username = get("CB_USERNAME").or(self.username);
        self.token = get("CB_TOKEN").or(self.token);
        if let Some(raw) = get("CB_TIMEOUT") {
            let timeout = raw
                .trim()
                .parse::<i64>()
                .map_err(|_| Error::Config(format!("CB_TIMEOUT must be an integer, got '{raw}'")))?;
            self.timeout = Some(timeout);
        }
        if let Some(raw) = get("CB_TESTBED") {
            self.testbed = parse_bool("CB_TESTBED", &raw)?;
        }
        self.influx_url = get("INFLUXDB_URL").or(self.influx_url);
        self.influx_token = get("INFLUXDB_TOKEN").or(self.influx_token);
        self.influx_org = get("INFLUXDB_ORG").or(self.influx_org);
        self.influx_bucket = get("INFLUXDB_BUCKET").or(self.influx_bucket);
        self.influx_measurement = get("INFLUXDB_MEASUREMENT").or(self.influx_measurement);
        Ok(self)
    }

    /// Boolean flags only ever switch a setting on.
    pub fn merge_args(mut self, args: &Args) -> Self {
        self.username = non_empty(args.username.clone()).or(self.username);
        self.token = non_empty(args.token.clone()).or(self.token);
        self.timeout = args.timeout.or(self.timeout);
        self.testbed |= args.testbed;
        self.handler = non_empty(args.handler.clone()).or(self.handler);
        self.verbose |= args.verbose;
        if args.json_logs {
            self.log_format = LogFormat::Json;
        }
        self
    }

    pub fn environment(&self) -> Environment {
        match (&self.base_url, self.testbed) {
            (Some(url), _) => Environment::Custom(url.clone()),
            (None, true) => Environment::Testbed,
            (None, false) => Environment::Production,
        }
    }

    pub fn resolve(self) -> Result<RunConfig, Error> {
        let username = self.username.clone().ok_or_else(|| {
            Error::Config("username is required (--username or CB_USERNAME)".into())
        })?;
        let token = self
            .token
            .clone()
            .ok_or_else(|| Error::Config("token is required (--token or CB_TOKEN)".into()))?;

        let mut client = ClientConfig::new(username, token).with_environment(self.environment());
        if let Some(timeout) = self.timeout {
            client = client.with_timeout(timeout);
        }
        client.validate()?;

        let handler = match &self.handler {
            Some(name) => name.parse::<HandlerKind>()?,
            None => HandlerKind::default(),
        };

        let influx = match handler {
            HandlerKind::Logging => None,
            HandlerKind::Database => Some(self.influx_settings()?),
        };

        Ok(RunConfig { client, handler, influx })
    }

    fn influx_settings(&self) -> Result<InfluxSettings, Error> {
        let require = |value: &Option<String>, env: &str| {
            value
                .clone()
                .ok_or_else(|| Error::Config(format!("the database handler needs {env}")))
        };
        let mut settings = InfluxSettings::new(
            require(&self.influx_url, "INFLUXDB_URL")?,
            require(&self.influx_token, "INFLUXDB_TOKEN")?,
            require(&self.influx_org, "INFLUXDB_ORG")?,
            require(&self.influx_bucket, "INFLUXDB_BUCKET")?,
        );
        settings.measurement = self
            .influx_measurement
            .clone()
            .unwrap_or_else(|| DEFAULT_MEASUREMENT.to_string());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name: &str| map.get(name).cloned()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn env_overrides_file_and_cli_overrides_env() {
        let file = FileConfig::from_yaml("username: from_file\ntoken: file_tok\ntimeout: 5\n").unwrap();
        let args = Args {
            username: Some("from_cli".into()),
            ..Default::default()
        };
        let settings = Settings::default()
            .merge_file(file)
            .merge_env(env(&[("CB_USERNAME", "from_env"), ("CB_TOKEN", "env_tok")]))
            .unwrap()
            .merge_args(&args);

        assert_eq!(settings.username.as_deref(), Some("from_cli"));
        assert_eq!(settings.token.as_deref(), Some("env_tok"));
        assert_eq!(settings.timeout, Some(5));
    }

    #[test]
    fn resolves_defaults() {
        let run = Settings::default()
            .merge_env(env(&[("CB_USERNAME", "caster"), ("CB_TOKEN", "tok")]))
            .unwrap()
            .resolve()
            .unwrap();
        assert_eq!(run.client.timeout_secs, 10);
        assert_eq!(run.client.environment, Environment::Production);
        assert_eq!(run.handler, HandlerKind::Logging);
        assert!(run.influx.is_none());
    }

    #[test]
    fn testbed_and_custom_base_url() {
        let settings = Settings::default()
            .merge_env(env(&[("CB_TESTBED", "true")]))
            .unwrap();
        assert_eq!(settings.environment(), Environment::Testbed);

        let file = FileConfig::from_yaml("base_url: http://localhost:8080\ntestbed: true\n").unwrap();
        let settings = settings.merge_file(file);
        assert_eq!(settings.environment(), Environment::Custom("http://localhost:8080".into()));
    }

    #[test]
    fn rejects_bad_env_values() {
        let err = Settings::default().merge_env(env(&[("CB_TIMEOUT", "soon")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = Settings::default().merge_env(env(&[("CB_TESTBED", "maybe")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_credentials_fail_resolution() {
        let err = Settings::default().resolve().unwrap_err();
        assert!(err.to_string().contains("username"));

        let args = Args {
            username: Some("caster".into()),
            token: Some("tok".into()),
            timeout: Some(-3),
            ..Default::default()
        };
        let err = Settings::default().merge_args(&args).resolve().unwrap_err();
        assert!(matches!(err, Error::Construction(_)));
    }

    #[test]
    fn database_handler_needs_influx_settings() {
        let base = Settings::default()
            .merge_env(env(&[("CB_USERNAME", "caster"), ("CB_TOKEN", "tok")]))
            .unwrap();
        let args = Args {
            handler: Some("database".into()),
            ..Default::default()
        };

        let err = base.clone().merge_args(&args).resolve().unwrap_err();
        assert!(err.to_string().contains("INFLUXDB_URL"));

        let run = base
            .merge_env(env(&[
                ("INFLUXDB_URL", "http://localhost:8086"),
                ("INFLUXDB_TOKEN", "itok"),
                ("INFLUXDB_ORG", "org"),
                ("INFLUXDB_BUCKET", "cb"),
            ]))
            .unwrap()
            .merge_args(&args)
            .resolve()
            .unwrap();
        assert_eq!(run.handler, HandlerKind::Database);
        let influx = run.influx.unwrap();
        assert_eq!(influx.bucket, "cb");
        assert_eq!(influx.measurement, "chaturbate_events");
    }

    #[test]
    fn unknown_handler_is_rejected() {
        let args = Args {
            username: Some("caster".into()),
            token: Some("tok".into()),
            handler: Some("csv".into()),
            ..Default::default()
        };
        let err = Settings::default().merge_args(&args).resolve().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn loads_yaml_file_with_influx_block() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "username: caster\ntoken: tok\nhandler: database\nlog_format: json\ninfluxdb:\n  url: http://influx:8086\n  token: t\n  org: o\n  bucket: b\n  measurement: room\n"
        )
        .unwrap();

        let settings = Settings::default()
            .merge_file(FileConfig::load(file.path()).unwrap())
            .merge_env(no_env)
            .unwrap();
        assert_eq!(settings.log_format, LogFormat::Json);
        let run = settings.resolve().unwrap();
        assert_eq!(run.influx.unwrap().measurement, "room");
    }

    #[test]
    fn unknown_yaml_keys_are_rejected() {
        assert!(FileConfig::from_yaml("usernme: typo\n").is_err());
    }
}
