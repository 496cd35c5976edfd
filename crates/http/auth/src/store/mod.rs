mod cookie;
mod memory;

pub use self::cookie::CookieStore;
pub use self::memory::MemoryStore;
