use std::rc::Rc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::repo::Repository;

/// Name of the httpOnly cookie carrying the session token. The cookie is the
/// only token source; there is no fallback to headers, body fields, or path
/// segments.
pub const SESSION_COOKIE: &str = "usertoken";

/// Session-resolution middleware.
///
/// Authentication only, never authorization: if the request carries a session
/// cookie that resolves to a user, that user is attached to the request
/// extensions; otherwise the extensions stay empty. The request always
/// proceeds — whether a missing identity matters is each handler's decision,
/// made through the `CurrentUser`/`MaybeUser` extractors.
pub struct SessionResolver;

impl<S, B> Transform<S, ServiceRequest> for SessionResolver
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = SessionResolverService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionResolverService {
            service: Rc::new(service),
        }))
    }
}

pub struct SessionResolverService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SessionResolverService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let token = req.cookie(SESSION_COOKIE).map(|c| c.value().to_owned());
            if let Some(token) = token {
                if let Some(repo) = req.app_data::<web::Data<dyn Repository>>() {
                    match repo.find_user_by_token(&token).await {
                        Ok(Some(user)) => {
                            req.extensions_mut().insert(user);
                        }
                        // Unknown token: proceed unauthenticated.
                        Ok(None) => {}
                        // Resolution is side-effect-free, so a storage error
                        // here degrades to "no identity" instead of failing
                        // requests that may not need one.
                        Err(err) => log::warn!("session resolution failed: {}", err),
                    }
                }
            }
            service.call(req).await
        })
    }
}
