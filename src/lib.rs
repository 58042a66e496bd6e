pub mod codec;
pub mod header;

pub mod model;
pub mod motion;

pub mod calibrate;
pub mod read;
pub mod read_vmd;
pub mod write;

pub mod io;

pub const PMD_MAGIC: [u8; 3] = [b'P', b'm', b'd'];
pub const VMD_SIGNATURE: &str = "Vocaloid Motion Data 0002";

/// Bone index value meaning "not bound to any bone".
pub const NO_BONE: u16 = 0xFFFF;

pub type HashMap<K, V> = rapidhash::RapidHashMap<K, V>;
pub type HashSet<T> = rapidhash::RapidHashSet<T>;
