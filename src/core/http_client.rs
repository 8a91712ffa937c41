use std::time::Duration;

const USER_AGENT: &str = concat!("music-dl/", env!("CARGO_PKG_VERSION"));

pub fn builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(15))
}

pub fn build_client() -> anyhow::Result<reqwest::Client> {
    Ok(builder().build()?)
}
