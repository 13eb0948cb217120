pub use crate::traits::{PlayerHostMock, StreamingEngineMock};
