//! Identity middleware.

use salvo::prelude::*;
use shopfront_app::domain::users::UserUuid;

use crate::extensions::*;

pub(crate) const USER_UUID_HEADER: &str = "x-user-uuid";

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let user = match extract_user_uuid(req) {
        Ok(user) => user,
        Err(status) => {
            res.render(status);
            ctrl.skip_rest();

            return;
        }
    };

    depot.insert_user_uuid(user);

    tracing::Span::current().record("user_uuid", tracing::field::display(user));

    ctrl.call_next(req, depot, res).await;
}

fn extract_user_uuid(req: &Request) -> Result<UserUuid, StatusError> {
    let value = req
        .headers()
        .get(USER_UUID_HEADER)
        .ok_or_else(|| StatusError::unauthorized().brief("Missing X-User-Uuid header"))?
        .to_str()
        .or_401("X-User-Uuid header is not valid text")?;

    value.trim().parse().or_401("X-User-Uuid header is not a UUID")
}
