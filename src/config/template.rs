//! Header/footer template applied to our own outgoing text.

use super::ConfigError;

/// Placeholder for the original message text inside the template.
pub const PLACEHOLDER: &str = "{message}";

/// Fixed text put around outgoing messages, e.g. an organisation banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapTemplate {
    header: String,
    footer: String,
}

impl WrapTemplate {
    /// Parse `header{message}footer`. The placeholder must appear exactly
    /// once and the template must add something around it.
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        let mut parts = template.split(PLACEHOLDER);
        let (Some(header), Some(footer), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ConfigError::Template(format!(
                "template must contain {} exactly once",
                PLACEHOLDER
            )));
        };

        if header.is_empty() && footer.is_empty() {
            return Err(ConfigError::Template(
                "template has no header or footer".to_string(),
            ));
        }

        Ok(Self {
            header: header.to_string(),
            footer: footer.to_string(),
        })
    }

    /// Whether `content` already carries the header and footer.
    pub fn is_wrapped(&self, content: &str) -> bool {
        content.len() >= self.header.len() + self.footer.len()
            && content.starts_with(&self.header)
            && content.ends_with(&self.footer)
    }

    /// Wrap `content`, leaving already wrapped text unchanged.
    pub fn wrap(&self, content: &str) -> String {
        if self.is_wrapped(content) {
            return content.to_string();
        }
        format!("{}{}{}", self.header, content, self.footer)
    }
}
