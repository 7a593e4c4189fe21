pub mod prototype;
pub mod registry;

pub use prototype::MonsterPrototype;
pub use registry::MonsterRegistry;
