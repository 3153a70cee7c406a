use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

use crate::model::role::Role;

/// Caller identity as resolved by the upstream gateway. The gateway
/// terminates the session and forwards who is calling in trusted headers;
/// this service never sees credentials.
pub struct CallerIdentity {
    pub user_id: u64,
    pub role: Role,
}

impl FromRequest for CallerIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user_id = match header(req, "X-User-Id").and_then(|v| v.parse::<u64>().ok()) {
            Some(id) => id,
            None => return ready(Err(ErrorUnauthorized("Missing or invalid X-User-Id"))),
        };

        let role = match header(req, "X-User-Role")
            .and_then(|v| v.parse::<u8>().ok())
            .and_then(Role::from_id)
        {
            Some(r) => r,
            None => return ready(Err(ErrorUnauthorized("Missing or invalid X-User-Role"))),
        };

        ready(Ok(CallerIdentity { user_id, role }))
    }
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|h| h.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn extracts_identity_from_gateway_headers() {
        let req = TestRequest::default()
            .insert_header(("X-User-Id", "7"))
            .insert_header(("X-User-Role", "3"))
            .to_http_request();

        let caller = CallerIdentity::extract(&req).await.unwrap();
        assert_eq!(caller.user_id, 7);
        assert_eq!(caller.role, Role::Employee);
    }

    #[actix_web::test]
    async fn missing_or_garbage_headers_are_unauthorized() {
        let missing = TestRequest::default().to_http_request();
        assert!(CallerIdentity::extract(&missing).await.is_err());

        let bad_role = TestRequest::default()
            .insert_header(("X-User-Id", "7"))
            .insert_header(("X-User-Role", "99"))
            .to_http_request();
        assert!(CallerIdentity::extract(&bad_role).await.is_err());

        let bad_id = TestRequest::default()
            .insert_header(("X-User-Id", "not-a-number"))
            .insert_header(("X-User-Role", "3"))
            .to_http_request();
        assert!(CallerIdentity::extract(&bad_id).await.is_err());
    }
}
