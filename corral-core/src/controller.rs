use std::any::{type_name, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::http::{Response, RouteRequest};
use crate::meta::RouteRegistry;
use crate::types::ApiResult;

/// Signature of a routable controller method.
pub type Handler<C> = fn(&C, RouteRequest) -> ApiResult<Response>;

/// A handler bound to a live controller instance.
pub type BoundHandler = Arc<dyn Fn(RouteRequest) -> ApiResult<Response> + Send + Sync>;

/// A group of request handlers for one resource.
///
/// Implementations describe their routes in [`declare`](Self::declare) and
/// expose their methods by name through [`resolve`](Self::resolve), usually
/// generated with [`handlers!`](crate::handlers). One instance is built per
/// application and shared by every concurrent request, so controllers should
/// only hold cheap, cloneable handles (services, repositories).
///
/// ```ignore
/// impl Controller<Services> for UserController {
///     fn from_state(state: &Services) -> Self {
///         Self { users: state.user_service.clone() }
///     }
///
///     fn declare(routes: &mut RouteRegistry) {
///         routes.declare_group::<Self>("/users");
///         routes.declare_route::<Self>("list", HttpVerb::Get, "");
///     }
///
///     fn resolve(method: &str) -> Option<Handler<Self>> {
///         corral_core::handlers!(method => Self { list })
///     }
/// }
/// ```
pub trait Controller<S>: Send + Sync + Sized + 'static {
    /// Construct the controller from application state.
    fn from_state(state: &S) -> Self;

    /// Record the group prefix and route declarations for this controller.
    fn declare(routes: &mut RouteRegistry);

    /// Look up a routable method by the name used in [`declare`](Self::declare).
    fn resolve(method: &str) -> Option<Handler<Self>>;
}

/// Build the name → method table behind [`Controller::resolve`].
///
/// ```ignore
/// fn resolve(method: &str) -> Option<Handler<Self>> {
///     corral_core::handlers!(method => Self { list, show, create })
/// }
/// ```
#[macro_export]
macro_rules! handlers {
    ($name:expr => $ty:ty { $($method:ident),* $(,)? }) => {
        match $name {
            $( stringify!($method) => {
                ::std::option::Option::Some(<$ty>::$method as $crate::controller::Handler<$ty>)
            } )*
            _ => ::std::option::Option::None,
        }
    };
}

/// A controller instance that can hand out bound handlers.
pub(crate) trait ControllerInstance: Send + Sync {
    fn bind(&self, method: &str) -> Option<BoundHandler>;
}

struct Instance<S, C> {
    controller: Arc<C>,
    _state: PhantomData<fn(&S)>,
}

impl<S: 'static, C: Controller<S>> ControllerInstance for Instance<S, C> {
    fn bind(&self, method: &str) -> Option<BoundHandler> {
        let handler = C::resolve(method)?;
        let controller = Arc::clone(&self.controller);
        Some(Arc::new(move |req| handler(&controller, req)))
    }
}

/// Type-erased entry in the ordered list of controllers handed to the binder.
pub struct ControllerDescriptor<S> {
    type_id: TypeId,
    type_name: &'static str,
    declare: fn(&mut RouteRegistry),
    instantiate: fn(&S) -> Box<dyn ControllerInstance>,
}

impl<S: 'static> ControllerDescriptor<S> {
    /// Descriptor for controller type `C`.
    pub fn of<C: Controller<S>>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            type_name: type_name::<C>(),
            declare: C::declare,
            instantiate: |state| {
                Box::new(Instance::<S, C> {
                    controller: Arc::new(C::from_state(state)),
                    _state: PhantomData,
                })
            },
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Run the controller's declarations against `registry`.
    pub fn declare(&self, registry: &mut RouteRegistry) {
        (self.declare)(registry)
    }

    pub(crate) fn instantiate(&self, state: &S) -> Box<dyn ControllerInstance> {
        (self.instantiate)(state)
    }
}
