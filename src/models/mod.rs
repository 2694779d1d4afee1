pub mod product;
pub mod user;

pub use product::{
    Product, NewProduct, CreateProduct, UpdateProduct,
    CostBreakdown, CostQuery, DeleteResponse
};
pub use user::{User, CreateUser, LoginRequest, UserResponse, TokenResponse};
