use serde::Deserialize;

use crate::workout::Coords;

const GEO_URL: &str = "http://ip-api.com/json/";

#[derive(Debug)]
pub enum GeolocateError {
    /// The service answered but could not produce a fix.
    Failed(String),
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl std::fmt::Display for GeolocateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeolocateError::Failed(msg) => write!(f, "Lookup failed: {msg}"),
            GeolocateError::Other(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for GeolocateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeolocateError::Failed(_) => None,
            GeolocateError::Other(e) => Some(&**e),
        }
    }
}

#[derive(Deserialize)]
struct GeoIpReply {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lon: f64,
}

fn locate_with_url(url: &str) -> Result<Coords, GeolocateError> {
    let response = ureq::get(url).set("Accept", "application/json").call();
    let resp = match response {
        Ok(r) => r
            .into_string()
            .map_err(|e| GeolocateError::Other(Box::new(e)))?,
        Err(e) => return Err(GeolocateError::Other(Box::new(e))),
    };
    let reply: GeoIpReply =
        serde_json::from_str(&resp).map_err(|e| GeolocateError::Other(Box::new(e)))?;
    if reply.status != "success" {
        return Err(GeolocateError::Failed(reply.message));
    }
    Ok(Coords {
        lat: reply.lat,
        lon: reply.lon,
    })
}

/// Estimate the current position from the machine's public IP address.
///
/// This is a coarse, city-level fix, which is plenty for choosing the
/// initial map view. The call blocks, so run it off the UI thread.
pub fn locate() -> Result<Coords, GeolocateError> {
    log::info!("Requesting a position fix from {GEO_URL}");
    locate_with_url(GEO_URL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn success_reply_yields_coords() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/json/");
            then.status(200)
                .body(r#"{"status":"success","lat":50.0614,"lon":19.9383}"#);
        });

        let coords = locate_with_url(&server.url("/json/")).unwrap();
        assert!((coords.lat - 50.0614).abs() < 1e-9);
        assert!((coords.lon - 19.9383).abs() < 1e-9);

        m.assert();
    }

    #[test]
    fn fail_status_maps_to_failed() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/json/");
            then.status(200)
                .body(r#"{"status":"fail","message":"private range"}"#);
        });

        let err = locate_with_url(&server.url("/json/")).unwrap_err();
        match err {
            GeolocateError::Failed(msg) => assert_eq!(msg, "private range"),
            e => panic!("unexpected error: {e:?}"),
        }

        m.assert();
    }

    #[test]
    fn http_error_maps_to_other() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/json/");
            then.status(500).body("boom");
        });

        let err = locate_with_url(&server.url("/json/")).unwrap_err();
        assert!(matches!(err, GeolocateError::Other(_)));

        m.assert();
    }

    #[test]
    fn garbage_body_maps_to_other() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/json/");
            then.status(200).body("not json");
        });

        let err = locate_with_url(&server.url("/json/")).unwrap_err();
        assert!(matches!(err, GeolocateError::Other(_)));

        m.assert();
    }
}
