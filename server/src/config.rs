use std::net::SocketAddr;

use clap::Parser;
use clap::builder::FalseyValueParser;

use domain::SessionConfig;

#[derive(Parser, Debug)]
#[command(name = "server", about = "Pairs players into real-time click races over WebSockets")]
pub struct Settings {
    /// Address to listen on
    #[arg(long, env = "WB_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Start every session immediately against a stand-in opponent
    #[arg(long, env = "WB_SINGLE_PLAYER", value_parser = FalseyValueParser::new())]
    pub single_player: bool,

    /// Clicks needed to win
    #[arg(long, env = "WB_WIN_COUNT", default_value_t = SessionConfig::default().win_count)]
    pub win_count: u32,

    /// First value of the pre-game countdown
    #[arg(long, env = "WB_COUNTDOWN_FROM", default_value_t = SessionConfig::default().countdown_from)]
    pub countdown_from: u32,
}

impl Settings {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            win_count: self.win_count,
            countdown_from: self.countdown_from,
            ..SessionConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::try_parse_from(["server"]).unwrap();

        assert_eq!(settings.bind, "0.0.0.0:3000".parse().unwrap());
        assert!(!settings.single_player);
        assert_eq!(settings.session_config(), SessionConfig::default());
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::try_parse_from([
            "server",
            "--bind",
            "127.0.0.1:9000",
            "--single-player",
            "--win-count",
            "10",
            "--countdown-from",
            "3",
        ])
        .unwrap();

        assert_eq!(settings.bind.port(), 9000);
        assert!(settings.single_player);
        let config = settings.session_config();
        assert_eq!((config.win_count, config.countdown_from), (10, 3));
        assert_eq!(config.scoreboard_interval, SessionConfig::default().scoreboard_interval);
    }

    #[test]
    fn test_rejects_negative_win_count() {
        assert!(Settings::try_parse_from(["server", "--win-count", "-1"]).is_err());
    }
}
