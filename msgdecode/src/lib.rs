//! Decoder for Outlook `.msg` files (compound files laid out per MS-OXMSG).
//!
//! Open the file with [`cfb`], copy its tree into a [`StorageNode`] and hand
//! that to [`decode_message`].

pub mod assemble;
pub mod entity;
pub mod error;
pub mod nameid;
pub mod options;
pub mod props_stream;
pub mod storage;
pub mod value;
#[cfg(test)]
mod testutil;


pub use crate::assemble::{decode_message, decode_message_with};
pub use crate::entity::{
    Appointment, AttachMethod, Attachment, FlagStatus, Importance, Message, MessageKind, Property,
    PropertyFault, PropertyKey, PropertySet, Recipient, RecipientType, StorageFault, Task,
};
pub use crate::error::DecodeError;
pub use crate::nameid::NameIdMap;
pub use crate::options::DecodeOptions;
pub use crate::props_stream::StorageRole;
pub use crate::storage::{CompoundSource, StorageNode};
