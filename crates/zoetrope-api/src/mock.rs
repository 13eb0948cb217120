pub use crate::traits::BackendMock;
