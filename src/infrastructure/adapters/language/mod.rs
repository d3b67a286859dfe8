//! Language Adapter - 语言识别实现

mod whatlang_model;

pub use whatlang_model::WhatlangModel;
