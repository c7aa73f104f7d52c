//! Request handler definitions
//!
//! Define each route and its handler here. Anything longer than a few lines belongs in [`crate::interactions`].
//!
//! Handlers must never block the worker thread. Each worker processes its requests sequentially, so all I/O (the
//! database and the Discord REST API) is expressed as futures.
use actix_web::{get, web, HttpResponse, Responder};
use discord_tools::data_objects::Interaction;
use log::*;
use trade_engine::{AnnouncementGateway, GuildDirectory, TradeDeskDatabase};

use crate::{errors::ServerError, interactions::TradeDesk};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// -------------------------------------------   Interactions  -------------------------------------------------
// Mounted inside the signature-checking `/interactions` scope, so the resource itself is the scope root.
route!(interactions => Post "" impl TradeDeskDatabase, AnnouncementGateway, GuildDirectory);
/// Route handler for Discord interactions.
///
/// The interaction is handled on its own task. If Discord hangs up early, the request future is dropped, but the
/// task runs to completion so that a transition that was already issued is never abandoned halfway.
pub async fn interactions<B, G, D>(
    body: web::Json<Interaction>,
    desk: web::Data<TradeDesk<B, G, D>>,
) -> Result<HttpResponse, ServerError>
where
    B: TradeDeskDatabase + 'static,
    G: AnnouncementGateway + 'static,
    D: GuildDirectory + 'static,
{
    let interaction = body.into_inner();
    trace!("💻️ Received interaction {} (type {})", interaction.id, interaction.kind);
    let desk = desk.into_inner();
    let task = actix_web::rt::spawn(async move { desk.handle(interaction).await });
    let response = task.await.map_err(|e| {
        error!("💻️ Interaction task failed. {e}");
        ServerError::BackendError(e.to_string())
    })??;
    Ok(HttpResponse::Ok().json(response))
}
