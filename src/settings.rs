use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;

use crate::config::{StreamConfig, Waveform};
use crate::stream::DEFAULT_INTERVAL;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeKind {
    Dark,
    Light,
}

impl ThemeKind {
    pub const ALL: [ThemeKind; 2] = [ThemeKind::Dark, ThemeKind::Light];

    pub fn label(self) -> &'static str {
        match self {
            ThemeKind::Dark => "Dark",
            ThemeKind::Light => "Light",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "light" => ThemeKind::Light,
            _ => ThemeKind::Dark,
        }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            ThemeKind::Dark => "dark",
            ThemeKind::Light => "light",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    pub theme: ThemeKind,
    pub stream: StreamConfig,
    pub tick_interval: Duration,
    pub data_path: String,
    pub x_label: String,
    pub y_label: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: ThemeKind::Dark,
            stream: StreamConfig::default(),
            tick_interval: DEFAULT_INTERVAL,
            data_path: "data/dataset.csv".to_string(),
            x_label: "X".to_string(),
            y_label: "Y".to_string(),
        }
    }
}

impl AppSettings {
    /// Missing files give defaults; unknown keys and unparsable values are
    /// skipped. A stream config that does not validate is replaced wholesale.
    pub fn load(path: &Path) -> Self {
        let mut settings = AppSettings::default();
        if let Ok(raw) = fs::read_to_string(path) {
            for line in raw.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    apply_kv(key.trim(), value.trim(), &mut settings);
                }
            }
        }
        if let Err(err) = settings.stream.validate() {
            warn!(
                "Stored stream settings in {} are invalid ({err}); using defaults",
                path.display()
            );
            settings.stream = StreamConfig::default();
        }
        settings
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let mut buf = String::new();
        buf.push_str(&format!("theme={}\n", self.theme.as_key()));
        buf.push_str(&format!(
            "tick_interval_ms={}\n",
            self.tick_interval.as_millis()
        ));
        buf.push_str(&format!("data_path={}\n", self.data_path));
        buf.push_str(&format!("x_label={}\n", self.x_label));
        buf.push_str(&format!("y_label={}\n", self.y_label));
        append_stream_lines(&mut buf, &self.stream);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, buf)
    }
}

pub fn default_settings_path() -> PathBuf {
    config_dir().join("streamscope_settings.cfg")
}

fn apply_kv(key: &str, value: &str, settings: &mut AppSettings) {
    match key {
        "theme" => settings.theme = ThemeKind::from_str(value),
        "tick_interval_ms" => {
            if let Ok(ms) = value.parse::<u64>() {
                settings.tick_interval = Duration::from_millis(ms.max(1));
            }
        }
        "data_path" => settings.data_path = value.to_string(),
        "x_label" => settings.x_label = value.to_string(),
        "y_label" => settings.y_label = value.to_string(),
        "amplitude" => parse_f64(value, &mut settings.stream.amplitude),
        "frequency" => parse_f64(value, &mut settings.stream.frequency),
        "noise" => parse_f64(value, &mut settings.stream.noise),
        "x_step" => parse_f64(value, &mut settings.stream.x_step),
        "waveform" => settings.stream.waveform = Waveform::from_key(value),
        "max_points" => {
            if let Ok(v) = value.parse::<usize>() {
                settings.stream.max_points = v;
            }
        }
        _ => {}
    }
}

fn parse_f64(value: &str, target: &mut f64) {
    if let Ok(v) = value.parse::<f64>() {
        *target = v;
    }
}

fn append_stream_lines(buf: &mut String, config: &StreamConfig) {
    buf.push_str(&format!("amplitude={}\n", config.amplitude));
    buf.push_str(&format!("frequency={}\n", config.frequency));
    buf.push_str(&format!("noise={}\n", config.noise));
    buf.push_str(&format!("x_step={}\n", config.x_step));
    buf.push_str(&format!("waveform={}\n", config.waveform.as_key()));
    buf.push_str(&format!("max_points={}\n", config.max_points));
}

fn config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(roaming) = std::env::var("APPDATA") {
            return PathBuf::from(roaming).join("StreamScope");
        }
        if let Ok(local) = std::env::var("LOCALAPPDATA") {
            return PathBuf::from(local).join("StreamScope");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = home_dir() {
            return home
                .join("Library")
                .join("Application Support")
                .join("StreamScope");
        }
    }

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("streamscope");
    }

    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("streamscope")
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from).or_else(|| {
        #[cfg(target_os = "windows")]
        {
            std::env::var("USERPROFILE").ok().map(PathBuf::from)
        }
        #[cfg(not(target_os = "windows"))]
        {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AppSettings::load(&dir.path().join("absent.cfg"));
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("settings.cfg");
        let settings = AppSettings {
            theme: ThemeKind::Light,
            stream: StreamConfig {
                amplitude: 2.5,
                frequency: 1.25,
                noise: 0.0,
                x_step: 0.01,
                waveform: Waveform::RandomWalk,
                max_points: 250,
            },
            tick_interval: Duration::from_millis(40),
            data_path: "/tmp/run.csv".to_string(),
            x_label: "time (s)".to_string(),
            y_label: "volts".to_string(),
        };

        settings.save(&path).unwrap();
        assert_eq!(AppSettings::load(&path), settings);
    }

    #[test]
    fn skips_comments_and_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.cfg");
        fs::write(
            &path,
            "# comment\nfrequency=abc\namplitude = 3\nunknown=1\nmax_points=-4\n",
        )
        .unwrap();

        let settings = AppSettings::load(&path);
        assert_eq!(settings.stream.amplitude, 3.0);
        assert_eq!(settings.stream.frequency, 0.5);
        assert_eq!(settings.stream.max_points, 5000);
    }

    #[test]
    fn invalid_stream_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.cfg");
        fs::write(&path, "theme=light\nwaveform=triangle\namplitude=4\n").unwrap();

        let settings = AppSettings::load(&path);
        assert_eq!(settings.theme, ThemeKind::Light);
        assert_eq!(settings.stream, StreamConfig::default());
    }
}
