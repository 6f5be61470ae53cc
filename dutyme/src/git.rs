/// `user.email` from the user's git configuration, if any.
///
/// The PagerDuty account is often registered with the same address.
pub fn default_email() -> Option<String> {
    let config = match git2::Config::open_default() {
        Ok(config) => config,
        Err(e) => {
            tracing::debug!("cannot open git config: {}", e);
            return None;
        }
    };

    email_from(&config)
}

fn email_from(config: &git2::Config) -> Option<String> {
    config
        .get_string("user.email")
        .ok()
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty())
}
