/// Whether the database connection is encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Encrypted,
    Plain,
}

/// Configuration for the blog database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection string as configured. May carry a `tls=false` or
    /// `ssl=false` flag for local, unencrypted servers.
    pub url: String,
    /// Logical database holding the blog collections.
    pub database_name: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Query parameters understood by other drivers that the Postgres driver
/// would reject.
const FOREIGN_PARAMS: [&str; 3] = ["tls", "ssl", "directconnection"];

impl DatabaseConfig {
    /// Transport requested by the connection string. Encrypted unless the
    /// string explicitly opts out.
    pub fn transport(&self) -> Transport {
        let lower = self.url.to_lowercase();
        if lower.contains("tls=false")
            || lower.contains("ssl=false")
            || lower.contains("sslmode=disable")
        {
            Transport::Plain
        } else {
            Transport::Encrypted
        }
    }

    /// The connection string rewritten for the Postgres driver: foreign
    /// flags are dropped and `sslmode` is set from [`Self::transport`]
    /// unless the string already names one.
    pub fn connection_url(&self) -> String {
        let (base, query) = self
            .url
            .split_once('?')
            .unwrap_or((self.url.as_str(), ""));

        let mut params: Vec<String> = query
            .split('&')
            .filter(|p| !p.is_empty())
            .filter(|p| {
                let key = p.split('=').next().unwrap_or_default().to_lowercase();
                !FOREIGN_PARAMS.contains(&key.as_str())
            })
            .map(str::to_string)
            .collect();

        let has_sslmode = params
            .iter()
            .any(|p| p.to_lowercase().starts_with("sslmode="));
        if !has_sslmode {
            let mode = match self.transport() {
                Transport::Encrypted => "require",
                Transport::Plain => "disable",
            };
            params.push(format!("sslmode={mode}"));
        }

        format!("{base}?{}", params.join("&"))
    }

    /// Schema the collections live in, derived from the database name.
    pub fn schema(&self) -> String {
        let schema: String = self
            .database_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();
        if schema.is_empty() {
            "blog".to_string()
        } else {
            schema
        }
    }
}
