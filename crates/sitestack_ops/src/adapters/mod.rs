pub mod cdn;
pub mod identity;
pub mod object_store;
pub mod parameter_store;
pub mod process;
pub mod stack_outputs;

pub use cdn::CdnInvalidator;
pub use identity::IdentityProviderRegistry;
pub use object_store::ObjectStore;
pub use parameter_store::ParameterStore;
pub use process::{CommandRunner, Invocation, SystemCommandRunner};
pub use stack_outputs::{require_output, StackOutputReader};
