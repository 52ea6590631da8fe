use crate::context::Context;

/// Static security response headers.
pub fn secure() -> impl Fn(&mut Context<'_>) + Send + Sync + 'static {
    |c: &mut Context<'_>| {
        c.set_header("X-Content-Type-Options", "nosniff");
        c.set_header("X-Frame-Options", "DENY");
        c.set_header("X-XSS-Protection", "1; mode=block");
        c.set_header(
            "Strict-Transport-Security",
            "max-age=31536000; includeSubDomains",
        );
        c.next();
    }
}
