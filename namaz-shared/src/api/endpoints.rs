use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use super::API_V1_PREFIX;

fn base_join(base: &str, path: &str) -> String {
    let b = base.trim_end_matches('/');
    let p = path.trim_start_matches('/');
    format!("{}/{}", b, p)
}

fn enc(s: &str) -> String {
    utf8_percent_encode(s, NON_ALPHANUMERIC).to_string()
}

pub fn registrations(base: &str) -> String {
    base_join(base, &format!("{}/registrations", API_V1_PREFIX))
}

pub fn device_events(base: &str, token: &str) -> String {
    base_join(
        base,
        &format!("{}/devices/{}/events", API_V1_PREFIX, enc(token)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_without_double_slash() {
        assert_eq!(
            registrations("https://push.example/"),
            "https://push.example/v1/registrations"
        );
    }

    #[test]
    fn token_is_path_encoded() {
        assert_eq!(
            device_events("https://push.example", "a:b/c"),
            "https://push.example/v1/devices/a%3Ab%2Fc/events"
        );
    }
}
