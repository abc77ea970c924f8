//! Decoded entities and their read-only views.

use std::fmt;

use chrono::{DateTime, Utc};
use from_to_repr::from_to_other;
use msox::{catalog, NamedProperty, PropTag, PropValue, PropertyTag};
use msox::property_sets::{PS_PUBLIC_STRINGS, PSETID_APPOINTMENT, PSETID_COMMON, PSETID_TASK};

use crate::error::DecodeError;
use crate::props_stream::PropertiesHeader;


/// FILETIME ticks between 1601-01-01 and 1970-01-01.
const FILETIME_UNIX_EPOCH: i64 = 116_444_736_000_000_000;
const FILETIME_TICKS_PER_SECOND: i64 = 10_000_000;

/// Converts a FILETIME (100 ns ticks since 1601) to a UTC timestamp.
pub fn filetime_to_datetime(filetime: i64) -> Option<DateTime<Utc>> {
    let since_unix = filetime.checked_sub(FILETIME_UNIX_EPOCH)?;
    let seconds = since_unix.div_euclid(FILETIME_TICKS_PER_SECOND);
    let nanos = since_unix.rem_euclid(FILETIME_TICKS_PER_SECOND) * 100;
    DateTime::from_timestamp(seconds, nanos as u32)
}


/// How a property was identified.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyKey {
    /// An ordinary numeric property.
    Tagged(PropTag),
    /// A named-range id resolved through the name-id mapping.
    Named(NamedProperty),
    /// A named-range id with no mapping entry.
    UnresolvedNamed(u16),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub tag: PropertyTag,
    pub flags: u32,
    pub key: PropertyKey,
    pub value: PropValue,
}
impl Property {
    /// Symbolic name from the catalog (or the property's own string name),
    /// `None` when the property is unknown.
    pub fn semantic_name(&self) -> Option<&str> {
        match &self.key {
            PropertyKey::Tagged(_) => catalog::lookup(self.tag.id).map(|info| info.name),
            PropertyKey::Named(named) => catalog::named_property_name(named),
            PropertyKey::UnresolvedNamed(_) => None,
        }
    }
}
impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.semantic_name(), &self.key) {
            (Some(name), _) => write!(f, "{} ({})", name, self.tag),
            (None, PropertyKey::Named(named)) => write!(f, "{} ({})", named, self.tag),
            (None, _) => write!(f, "{}", self.tag),
        }
    }
}

/// A property that could not be decoded.
#[derive(Debug)]
pub struct PropertyFault {
    pub tag: PropertyTag,
    pub error: DecodeError,
}

/// A sub-storage (recipient, attachment, embedded message, name-id mapping)
/// that could not be decoded.
#[derive(Debug)]
pub struct StorageFault {
    pub storage: String,
    pub error: DecodeError,
}


/// The decoded properties of one storage, in properties-stream order.
#[derive(Debug, Default)]
pub struct PropertySet {
    properties: Vec<Property>,
    faults: Vec<PropertyFault>,
}
impl PropertySet {
    pub(crate) fn push(&mut self, property: Property) {
        self.properties.push(property);
    }

    pub(crate) fn push_fault(&mut self, fault: PropertyFault) {
        self.faults.push(fault);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn faults(&self) -> &[PropertyFault] {
        &self.faults
    }

    /// First property with the given numeric id, whatever its type.
    pub fn get(&self, id: u16) -> Option<&Property> {
        self.properties.iter().find(|p| p.tag.id == id)
    }

    pub fn get_tag(&self, tag: PropTag) -> Option<&PropValue> {
        self.get(tag.into()).map(|p| &p.value)
    }

    pub fn get_named(&self, named: &NamedProperty) -> Option<&PropValue> {
        self.properties.iter()
            .find(|p| matches!(&p.key, PropertyKey::Named(n) if n == named))
            .map(|p| &p.value)
    }

    /// Looks a property up by its symbolic name, e.g. `"Subject"` or
    /// `"Keywords"`.
    pub fn get_by_name(&self, name: &str) -> Option<&PropValue> {
        self.properties.iter()
            .find(|p| p.semantic_name() == Some(name))
            .map(|p| &p.value)
    }

    fn string(&self, tag: PropTag) -> Option<&str> {
        self.get_tag(tag).and_then(|v| v.as_str())
    }

    fn integer(&self, tag: PropTag) -> Option<i64> {
        self.get_tag(tag).and_then(|v| v.as_integer())
    }

    fn time(&self, tag: PropTag) -> Option<DateTime<Utc>> {
        self.get_tag(tag)
            .and_then(|v| v.as_filetime())
            .and_then(filetime_to_datetime)
    }

    fn named_time(&self, named: &NamedProperty) -> Option<DateTime<Utc>> {
        self.get_named(named)
            .and_then(|v| v.as_filetime())
            .and_then(filetime_to_datetime)
    }
}


#[derive(Clone, Copy, Debug)]
#[from_to_other(base_type = i32, derive_compare = "as_int")]
pub enum RecipientType {
    Originator = 0,
    To = 1,
    Cc = 2,
    Bcc = 3,
    Other(i32),
}

#[derive(Clone, Copy, Debug)]
#[from_to_other(base_type = i32, derive_compare = "as_int")]
pub enum AttachMethod {
    NoAttachment = 0,
    ByValue = 1,
    ByReference = 2,
    ByRefResolve = 3,
    ByRefOnly = 4,
    EmbeddedMessage = 5,
    Ole = 6,
    Other(i32),
}

#[derive(Clone, Copy, Debug)]
#[from_to_other(base_type = i32, derive_compare = "as_int")]
pub enum Importance {
    Low = 0,
    Normal = 1,
    High = 2,
    Other(i32),
}

#[derive(Clone, Copy, Debug)]
#[from_to_other(base_type = i32, derive_compare = "as_int")]
pub enum FlagStatus {
    NotFlagged = 0,
    Complete = 1,
    Flagged = 2,
    Other(i32),
}

/// Resend marker that may be OR-ed into the recipient type.
const RECIPIENT_TYPE_RESEND: i32 = 0x1000_0000;


#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MessageKind {
    Email,
    Task,
    Appointment,
    Contact,
    StickyNote,
    Other,
    /// No message class present.
    Unknown,
}
impl MessageKind {
    pub fn from_message_class(class: &str) -> Self {
        let class = class.to_ascii_lowercase();
        let is = |prefix: &str| class == prefix || class.starts_with(&format!("{}.", prefix));
        if is("ipm.note") {
            Self::Email
        } else if is("ipm.task") {
            Self::Task
        } else if is("ipm.appointment") || is("ipm.schedule.meeting") {
            Self::Appointment
        } else if is("ipm.contact") {
            Self::Contact
        } else if is("ipm.stickynote") {
            Self::StickyNote
        } else {
            Self::Other
        }
    }
}


#[derive(Debug)]
pub struct Message {
    pub properties: PropertySet,
    pub recipients: Vec<Recipient>,
    pub attachments: Vec<Attachment>,
    pub header: Option<PropertiesHeader>,
    pub faults: Vec<StorageFault>,
}
impl Message {
    pub fn message_class(&self) -> Option<&str> {
        self.properties.string(PropTag::TagMessageClass)
    }

    pub fn kind(&self) -> MessageKind {
        match self.message_class() {
            Some(class) => MessageKind::from_message_class(class),
            None => MessageKind::Unknown,
        }
    }

    pub fn subject(&self) -> Option<&str> {
        self.properties.string(PropTag::TagSubject)
    }

    pub fn body(&self) -> Option<&str> {
        self.properties.string(PropTag::TagBody)
    }

    /// The HTML body; stored as binary in its declared code page, or
    /// occasionally as a string.
    pub fn body_html(&self) -> Option<&[u8]> {
        match self.properties.get_tag(PropTag::TagBodyHtml)? {
            PropValue::Binary(b) => Some(b.as_slice()),
            PropValue::String(s)|PropValue::String8(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Compressed RTF body, still compressed.
    pub fn rtf_compressed(&self) -> Option<&[u8]> {
        self.properties.get_tag(PropTag::TagRtfCompressed).and_then(|v| v.as_bytes())
    }

    pub fn sender_name(&self) -> Option<&str> {
        self.properties.string(PropTag::TagSenderName)
            .or_else(|| self.properties.string(PropTag::TagSentRepresentingName))
    }

    /// The sender's address, preferring an SMTP address over the native one.
    pub fn sender_email(&self) -> Option<&str> {
        self.properties.string(PropTag::TagSenderSmtpAddress)
            .or_else(|| self.properties.string(PropTag::TagSenderEmailAddress))
            .or_else(|| self.properties.string(PropTag::TagSentRepresentingSmtpAddress))
            .or_else(|| self.properties.string(PropTag::TagSentRepresentingEmailAddress))
    }

    pub fn display_to(&self) -> Option<&str> {
        self.properties.string(PropTag::TagDisplayTo)
    }

    pub fn display_cc(&self) -> Option<&str> {
        self.properties.string(PropTag::TagDisplayCc)
    }

    pub fn display_bcc(&self) -> Option<&str> {
        self.properties.string(PropTag::TagDisplayBcc)
    }

    pub fn sent_on(&self) -> Option<DateTime<Utc>> {
        self.properties.time(PropTag::TagClientSubmitTime)
    }

    pub fn provider_submit_time(&self) -> Option<DateTime<Utc>> {
        self.properties.time(PropTag::TagProviderSubmitTime)
    }

    pub fn received_on(&self) -> Option<DateTime<Utc>> {
        self.properties.time(PropTag::TagMessageDeliveryTime)
    }

    pub fn importance(&self) -> Option<Importance> {
        self.properties.integer(PropTag::TagImportance)
            .map(|i| Importance::from_base_type(i as i32))
    }

    pub fn internet_codepage(&self) -> Option<i64> {
        self.properties.integer(PropTag::TagInternetCodepage)
    }

    pub fn flag_status(&self) -> Option<FlagStatus> {
        self.properties.integer(PropTag::TagFlagStatus)
            .map(|i| FlagStatus::from_base_type(i as i32))
    }

    pub fn flag_complete_time(&self) -> Option<DateTime<Utc>> {
        self.properties.time(PropTag::TagFlagCompleteTime)
    }

    /// Follow-up flag text, e.g. "Follow up".
    pub fn flag_request(&self) -> Option<&str> {
        self.properties.get_named(&NamedProperty::with_id(PSETID_COMMON, 0x8530))
            .and_then(|v| v.as_str())
    }

    /// Categories assigned to the message.
    pub fn keywords(&self) -> Vec<String> {
        match self.properties.get_named(&NamedProperty::with_name(PS_PUBLIC_STRINGS, "Keywords")) {
            Some(value) => match value.as_strings() {
                Some(values) => values.to_vec(),
                None => value.as_str().map(|s| vec![s.to_owned()]).unwrap_or_default(),
            },
            None => Vec::new(),
        }
    }

    /// Internet headers as received, if the message came in over SMTP.
    pub fn transport_message_headers(&self) -> Option<&str> {
        self.properties.string(PropTag::TagTransportMessageHeaders)
    }

    pub fn recipients_of_type(&self, recipient_type: RecipientType) -> impl Iterator<Item = &Recipient> {
        self.recipients.iter()
            .filter(move |r| r.recipient_type() == Some(recipient_type))
    }

    pub fn to(&self) -> Vec<&Recipient> {
        self.recipients_of_type(RecipientType::To).collect()
    }

    pub fn cc(&self) -> Vec<&Recipient> {
        self.recipients_of_type(RecipientType::Cc).collect()
    }

    pub fn bcc(&self) -> Vec<&Recipient> {
        self.recipients_of_type(RecipientType::Bcc).collect()
    }

    /// Task view, if this message is a task.
    pub fn task(&self) -> Option<Task<'_>> {
        if self.kind() == MessageKind::Task {
            Some(Task { properties: &self.properties })
        } else {
            None
        }
    }

    /// Appointment view, if this message is an appointment or meeting.
    pub fn appointment(&self) -> Option<Appointment<'_>> {
        if self.kind() == MessageKind::Appointment {
            Some(Appointment { properties: &self.properties })
        } else {
            None
        }
    }
}


#[derive(Debug)]
pub struct Recipient {
    /// Name of the recipient's sub-storage.
    pub storage: String,
    pub properties: PropertySet,
}
impl Recipient {
    pub fn display_name(&self) -> Option<&str> {
        self.properties.string(PropTag::TagDisplayName)
            .or_else(|| self.properties.string(PropTag::TagRecipientDisplayName))
    }

    pub fn email(&self) -> Option<&str> {
        self.properties.string(PropTag::TagSmtpAddress)
            .or_else(|| self.properties.string(PropTag::TagEmailAddress))
            .or_else(|| self.properties.string(PropTag::TagEmail2))
    }

    pub fn address_type(&self) -> Option<&str> {
        self.properties.string(PropTag::TagAddressType)
    }

    pub fn recipient_type(&self) -> Option<RecipientType> {
        self.properties.integer(PropTag::TagRecipientType)
            .map(|i| RecipientType::from_base_type((i as i32) & !RECIPIENT_TYPE_RESEND))
    }
}


#[derive(Debug)]
pub struct Attachment {
    /// Name of the attachment's sub-storage.
    pub storage: String,
    pub properties: PropertySet,
    /// The attached message, for embedded-message attachments.
    pub embedded: Option<Box<Message>>,
}
impl Attachment {
    pub fn method(&self) -> AttachMethod {
        match self.properties.integer(PropTag::TagAttachMethod) {
            Some(i) => AttachMethod::from_base_type(i as i32),
            None => AttachMethod::NoAttachment,
        }
    }

    /// File name, preferring the long form.
    pub fn file_name(&self) -> Option<&str> {
        self.properties.string(PropTag::TagAttachLongFilename)
            .or_else(|| self.properties.string(PropTag::TagAttachFilename))
            .or_else(|| self.properties.string(PropTag::TagDisplayName))
    }

    pub fn extension(&self) -> Option<&str> {
        self.properties.string(PropTag::TagAttachExtension)
    }

    pub fn mime_tag(&self) -> Option<&str> {
        self.properties.string(PropTag::TagAttachMimeTag)
    }

    pub fn content_id(&self) -> Option<&str> {
        self.properties.string(PropTag::TagAttachContentId)
    }

    /// Character offset of the attachment in the body; -1 when it is not
    /// rendered inline.
    pub fn rendering_position(&self) -> Option<i64> {
        self.properties.integer(PropTag::TagRenderingPosition)
    }

    pub fn is_hidden(&self) -> bool {
        self.properties.get_tag(PropTag::TagAttachmentHidden)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Attachment bytes for by-value attachments (and OLE objects stored as
    /// a stream).
    pub fn data(&self) -> Option<&[u8]> {
        self.properties.get_tag(PropTag::TagAttachDataBinary).and_then(|v| v.as_bytes())
    }

    pub fn embedded_message(&self) -> Option<&Message> {
        self.embedded.as_deref()
    }
}


/// Task-specific properties of a message.
#[derive(Clone, Copy, Debug)]
pub struct Task<'m> {
    properties: &'m PropertySet,
}
impl<'m> Task<'m> {
    /// 0 not started, 1 in progress, 2 complete, 3 waiting, 4 deferred.
    pub fn status(&self) -> Option<i64> {
        self.properties.get_named(&NamedProperty::with_id(PSETID_TASK, 0x8101))
            .and_then(|v| v.as_integer())
    }

    /// Fraction between 0.0 and 1.0.
    pub fn percent_complete(&self) -> Option<f64> {
        self.properties.get_named(&NamedProperty::with_id(PSETID_TASK, 0x8102))
            .and_then(|v| v.as_floating())
    }

    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        self.properties.named_time(&NamedProperty::with_id(PSETID_TASK, 0x8104))
    }

    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        self.properties.named_time(&NamedProperty::with_id(PSETID_TASK, 0x8105))
    }

    pub fn complete(&self) -> Option<bool> {
        self.properties.get_named(&NamedProperty::with_id(PSETID_TASK, 0x811C))
            .and_then(|v| v.as_bool())
    }
}


/// Calendar-specific properties of a message.
#[derive(Clone, Copy, Debug)]
pub struct Appointment<'m> {
    properties: &'m PropertySet,
}
impl<'m> Appointment<'m> {
    pub fn location(&self) -> Option<&'m str> {
        self.properties.get_named(&NamedProperty::with_id(PSETID_APPOINTMENT, 0x8208))
            .and_then(|v| v.as_str())
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.properties.named_time(&NamedProperty::with_id(PSETID_APPOINTMENT, 0x820D))
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.properties.named_time(&NamedProperty::with_id(PSETID_APPOINTMENT, 0x820E))
    }

    /// 0 none, 1 daily, 2 weekly, 3 monthly, 4 yearly.
    pub fn recurrence_type(&self) -> Option<i64> {
        self.properties.get_named(&NamedProperty::with_id(PSETID_APPOINTMENT, 0x8231))
            .and_then(|v| v.as_integer())
    }

    /// Human-readable recurrence description, e.g. "every Monday".
    pub fn recurrence_pattern(&self) -> Option<&'m str> {
        self.properties.get_named(&NamedProperty::with_id(PSETID_APPOINTMENT, 0x8232))
            .and_then(|v| v.as_str())
    }
}
