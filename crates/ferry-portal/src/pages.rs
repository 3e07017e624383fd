//! HTML pages served by the portal.
//!
//! Pages are small and self-contained (inline CSS, no external assets) since
//! the client is a phone joined to the sign's access point with no internet.

use std::fmt::Write;

use ferry_core::RouteTable;

use crate::wifi::{display_ssid, ScanResult};

/// Sentinel option value for typing an SSID by hand.
pub const CUSTOM_NETWORK: &str = "__custom__";

const STYLE: &str = "body{font-family:Arial,sans-serif;text-align:center;margin:0;padding:20px;background:#f0f0f0}\
h1{color:#333;margin:20px 0 30px}\
form{display:inline-block;padding:30px;background:#fff;border-radius:10px;box-shadow:0 4px 6px rgba(0,0,0,.1);width:85%;max-width:400px}\
label{font-size:18px;display:block;margin-bottom:10px}\
select,input[type=text],input[type=password]{padding:10px;font-size:16px;width:100%;margin-bottom:20px;border:1px solid #ccc;border-radius:5px;box-sizing:border-box}\
input[type=submit]{padding:10px 20px;font-size:16px;background:#4CAF50;color:#fff;border:none;border-radius:5px;width:100%}";

/// Escape text for use in element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>{title}</title><meta charset=\"UTF-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\
<style>{STYLE}</style></head><body>{body}</body></html>"
    )
}

// ============================================================================
// WiFi phase
// ============================================================================

/// Network selection form.
pub fn wifi_page(networks: &[ScanResult]) -> String {
    let mut options = String::from("<option value=\"\">Select network...</option>");
    for network in networks {
        let _ = write!(
            options,
            "<option value=\"{}\">{}</option>",
            escape_html(&network.ssid),
            escape_html(&display_ssid(&network.ssid))
        );
    }
    let _ = write!(options, "<option value=\"{CUSTOM_NETWORK}\">Custom...</option>");

    page(
        "WiFi Configuration",
        &format!(
            "<h1>WiFi Configuration</h1><form method=\"POST\" action=\"/\">\
<label for=\"wifi_name\">WiFi Name:</label><select id=\"wifi_name\" name=\"wifi_name\">{options}</select>\
<label for=\"wifi_password\">WiFi Password:</label><input type=\"password\" id=\"wifi_password\" name=\"wifi_password\">\
<input type=\"submit\" value=\"Connect\"></form>"
        ),
    )
}

/// Free-text SSID form.
pub fn custom_network_page() -> String {
    page(
        "Custom WiFi Network",
        "<h1>Enter Custom WiFi Network</h1><form method=\"POST\" action=\"/\">\
<label for=\"wifi_name\">WiFi Name:</label>\
<input type=\"text\" id=\"wifi_name\" name=\"wifi_name\" placeholder=\"Enter network name...\">\
<label for=\"wifi_password\">WiFi Password:</label>\
<input type=\"password\" id=\"wifi_password\" name=\"wifi_password\">\
<input type=\"submit\" value=\"Connect\"></form>",
    )
}

pub fn wifi_error_page() -> String {
    page(
        "WiFi Connection Failed",
        "<h1>Could not connect</h1><p>The sign could not join that network or reach the internet.</p>\
<p><a href=\"/\">Try again</a></p>",
    )
}

// ============================================================================
// Ferry phase
// ============================================================================

/// Route, stop and direction form. Stops and headsigns are listed only for
/// the selected route; changing the route reloads with `?route=<code>`.
pub fn ferry_page(routes: &RouteTable, selected: Option<&str>) -> String {
    let selected_route = selected.and_then(|code| routes.route(code));

    let mut route_options = String::from("<option value=\"\">Select a route</option>");
    for route in routes.routes_sorted_by_name() {
        let marker = if Some(route.code) == selected { " selected" } else { "" };
        let _ = write!(
            route_options,
            "<option value=\"{}\"{}>{}</option>",
            escape_html(route.code),
            marker,
            escape_html(&route.display_name())
        );
    }

    let mut stop_options = String::from("<option value=\"\">Select a stop</option>");
    let mut headsign_options = String::from("<option value=\"\">Select a direction</option>");
    if let Some(route) = selected_route {
        for stop in route.sorted_stops() {
            let _ = write!(
                stop_options,
                "<option value=\"{}\">{}</option>",
                escape_html(stop.short_key()),
                escape_html(stop.name)
            );
        }
        for headsign in route.headsigns {
            let _ = write!(
                headsign_options,
                "<option value=\"{0}\">{0}</option>",
                escape_html(headsign)
            );
        }
    }

    page(
        "NYC Ferry Configuration",
        &format!(
            "<h1>NYC Ferry Configuration</h1><form method=\"POST\" action=\"/\">\
<label for=\"route\">Route:</label>\
<select id=\"route\" name=\"route\" onchange=\"window.location.href='?route='+this.value\">{route_options}</select>\
<label for=\"stop\">Stop:</label><select id=\"stop\" name=\"stop_id\">{stop_options}</select>\
<label for=\"headsign\">Direction:</label><select id=\"headsign\" name=\"headsign\">{headsign_options}</select>\
<input type=\"submit\" value=\"Save\"></form>"
        ),
    )
}

pub fn ferry_success_page() -> String {
    page(
        "Setup Complete",
        "<h1>Setup Complete</h1><p>Your sign is joining your WiFi and will start showing departures shortly.</p>\
<p>You can disconnect from this network.</p>",
    )
}

pub fn ferry_error_page() -> String {
    page(
        "Ferry Configuration Error",
        "<h1>Something went wrong</h1><p>Pick a route, a stop and a direction, then save again.</p>\
<p><a href=\"/\">Back</a></p>",
    )
}
