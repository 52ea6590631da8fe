use crate::context::Context;
use crate::method::Method;

/// Origin allow-list CORS filter. Preflight `OPTIONS` requests are
/// answered with 204 and the chain stops there.
pub fn cors(
    allow_origins: Vec<String>,
    allow_methods: Vec<String>,
    allow_headers: Vec<String>,
) -> impl Fn(&mut Context<'_>) + Send + Sync + 'static {
    move |c: &mut Context<'_>| {
        let origin = c.header("Origin").unwrap_or("").to_string();

        let allowed = allow_origins.iter().any(|o| o == "*" || *o == origin);
        if allowed {
            if allow_origins.len() == 1 && allow_origins[0] == "*" {
                c.set_header("Access-Control-Allow-Origin", "*");
            } else {
                c.set_header("Access-Control-Allow-Origin", &origin);
            }
            c.set_header("Access-Control-Allow-Methods", &allow_methods.join(", "));
            c.set_header("Access-Control-Allow-Headers", &allow_headers.join(", "));
            c.set_header("Access-Control-Allow-Credentials", "true");
        }

        if c.method() == Method::Options {
            c.abort_with_status(204);
            return;
        }

        c.next();
    }
}
