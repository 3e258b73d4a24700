use crate::messages::wire::WireProtocolError;
use std::fmt;
use std::str::FromStr;

/// Command tokens the runtime itself produces or reacts to.
pub mod command {
    pub const USER: &str = "USER";
    pub const NICK: &str = "NICK";
    pub const PING: &str = "PING";
    pub const PONG: &str = "PONG";
    pub const JOIN: &str = "JOIN";
    /// Welcome numeric sent once registration completes
    pub const RPL_WELCOME: &str = "001";
}

/// A single protocol line: `[:prefix] COMMAND [params...] [:trailing]`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
    pub trailing: Option<String>,
}

impl Message {
    /// Create a message with just a command token
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// Replace the middle parameter list
    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Set the trailing parameter
    pub fn with_trailing(mut self, trailing: impl Into<String>) -> Self {
        self.trailing = Some(trailing.into());
        self
    }

    /// Set the source prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// `USER <username> 0 * :<realname>`
    pub fn user(username: impl Into<String>, realname: impl Into<String>) -> Self {
        Self::new(command::USER)
            .with_params([username.into(), "0".to_string(), "*".to_string()])
            .with_trailing(realname)
    }

    /// `NICK <nickname>`
    pub fn nick(nickname: impl Into<String>) -> Self {
        Self::new(command::NICK).with_params([nickname.into()])
    }

    /// `PING :<token>`
    pub fn ping(token: impl Into<String>) -> Self {
        Self::new(command::PING).with_trailing(token)
    }

    /// `PONG :<token>`
    pub fn pong(token: impl Into<String>) -> Self {
        Self::new(command::PONG).with_trailing(token)
    }

    /// `JOIN <channel>`
    pub fn join(channel: impl Into<String>) -> Self {
        Self::new(command::JOIN).with_params([channel.into()])
    }

    /// Case-insensitive command comparison
    pub fn is_command(&self, command: &str) -> bool {
        self.command.eq_ignore_ascii_case(command)
    }

    /// The trailing parameter if present, otherwise the last middle parameter
    pub fn last_param(&self) -> Option<&str> {
        self.trailing
            .as_deref()
            .or_else(|| self.params.last().map(String::as_str))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        f.write_str(&self.command)?;
        for param in &self.params {
            write!(f, " {}", param)?;
        }
        if let Some(trailing) = &self.trailing {
            write!(f, " :{}", trailing)?;
        }
        Ok(())
    }
}

impl FromStr for Message {
    type Err = WireProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Err(WireProtocolError::malformed("empty line"));
        }

        let mut rest = line;
        let prefix = match rest.strip_prefix(':') {
            Some(stripped) => {
                let (prefix, remainder) = stripped
                    .split_once(' ')
                    .ok_or_else(|| WireProtocolError::malformed("prefix without command"))?;
                if prefix.is_empty() {
                    return Err(WireProtocolError::malformed("empty prefix"));
                }
                rest = remainder;
                Some(prefix.to_string())
            }
            None => None,
        };

        // The first " :" after the command starts the trailing parameter.
        let rest = rest.trim_start_matches(' ');
        let (middle, trailing) = match rest.find(" :") {
            Some(idx) => (&rest[..idx], Some(rest[idx + 2..].to_string())),
            None => (rest, None),
        };

        let mut tokens = middle.split(' ').filter(|token| !token.is_empty());
        let command = tokens
            .next()
            .filter(|command| !command.starts_with(':'))
            .ok_or_else(|| WireProtocolError::malformed("missing command"))?;

        Ok(Self {
            prefix,
            command: command.to_string(),
            params: tokens.map(str::to_string).collect(),
            trailing,
        })
    }
}
