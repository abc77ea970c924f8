//! Static catalog of well-known properties.
//!
//! Maps numeric property ids (and named-property identities) to a symbolic
//! name and the value type the property is expected to carry. Lookups never
//! fail; an absent entry simply means the property is not one we know about,
//! which is normal for client- and provider-defined properties.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use uuid::Uuid;

use crate::{NamedProperty, PropertyNameInfo, PropertyTag, PropTag, PropType};
use crate::property_sets::{
    PS_PUBLIC_STRINGS, PSETID_ADDRESS, PSETID_APPOINTMENT, PSETID_COMMON, PSETID_MEETING,
    PSETID_TASK,
};


#[derive(Clone, Copy, Debug)]
pub struct PropertyInfo {
    pub tag: PropTag,
    pub name: &'static str,
    pub prop_type: PropType,
}
impl PropertyInfo {
    pub fn id(&self) -> u16 {
        self.tag.into()
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NamedKey {
    Id(u32),
    Name(&'static str),
}

#[derive(Clone, Copy, Debug)]
pub struct NamedPropertyInfo {
    pub property_set: Uuid,
    pub key: NamedKey,
    pub name: &'static str,
    pub prop_type: PropType,
}
impl NamedPropertyInfo {
    pub fn named_property(&self) -> NamedProperty {
        match self.key {
            NamedKey::Id(id) => NamedProperty::with_id(self.property_set, id),
            NamedKey::Name(name) => NamedProperty::with_name(self.property_set, name),
        }
    }
}


macro_rules! prop {
    ($tag:ident, $name:expr, $prop_type:ident) => {
        PropertyInfo { tag: PropTag::$tag, name: $name, prop_type: PropType::$prop_type }
    };
}
macro_rules! named {
    ($set:expr, id $id:expr, $name:expr, $prop_type:ident) => {
        NamedPropertyInfo { property_set: $set, key: NamedKey::Id($id), name: $name, prop_type: PropType::$prop_type }
    };
    ($set:expr, name $key:expr, $name:expr, $prop_type:ident) => {
        NamedPropertyInfo { property_set: $set, key: NamedKey::Name($key), name: $name, prop_type: PropType::$prop_type }
    };
}


static PROPERTIES: &[PropertyInfo] = &[
    prop!(TagImportance, "Importance", Integer32),
    prop!(TagMessageClass, "MessageClass", String),
    prop!(TagOriginatorDeliveryReportRequested, "OriginatorDeliveryReportRequested", Boolean),
    prop!(TagPriority, "Priority", Integer32),
    prop!(TagReadReceiptRequested, "ReadReceiptRequested", Boolean),
    prop!(TagSensitivity, "Sensitivity", Integer32),
    prop!(TagSubject, "Subject", String),
    prop!(TagClientSubmitTime, "ClientSubmitTime", Time),
    prop!(TagSentRepresentingSearchKey, "SentRepresentingSearchKey", Binary),
    prop!(TagSubjectPrefix, "SubjectPrefix", String),
    prop!(TagReceivedByEntryId, "ReceivedByEntryId", Binary),
    prop!(TagReceivedByName, "ReceivedByName", String),
    prop!(TagSentRepresentingEntryId, "SentRepresentingEntryId", Binary),
    prop!(TagSentRepresentingName, "SentRepresentingName", String),
    prop!(TagMessageSubmissionId, "MessageSubmissionId", Binary),
    prop!(TagProviderSubmitTime, "ProviderSubmitTime", Time),
    prop!(TagReplyRecipientNames, "ReplyRecipientNames", String),
    prop!(TagSentRepresentingAddressType, "SentRepresentingAddressType", String),
    prop!(TagSentRepresentingEmailAddress, "SentRepresentingEmailAddress", String),
    prop!(TagConversationTopic, "ConversationTopic", String),
    prop!(TagConversationIndex, "ConversationIndex", Binary),
    prop!(TagTransportMessageHeaders, "TransportMessageHeaders", String),
    prop!(TagRecipientType, "RecipientType", Integer32),
    prop!(TagSenderEntryId, "SenderEntryId", Binary),
    prop!(TagSenderName, "SenderName", String),
    prop!(TagSenderSearchKey, "SenderSearchKey", Binary),
    prop!(TagSenderAddressType, "SenderAddressType", String),
    prop!(TagSenderEmailAddress, "SenderEmailAddress", String),
    prop!(TagDisplayBcc, "DisplayBcc", String),
    prop!(TagDisplayCc, "DisplayCc", String),
    prop!(TagDisplayTo, "DisplayTo", String),
    prop!(TagMessageDeliveryTime, "MessageDeliveryTime", Time),
    prop!(TagMessageFlags, "MessageFlags", Integer32),
    prop!(TagMessageSize, "MessageSize", Integer32),
    prop!(TagHasAttachments, "HasAttachments", Boolean),
    prop!(TagNormalizedSubject, "NormalizedSubject", String),
    prop!(TagRtfInSync, "RtfInSync", Boolean),
    prop!(TagAttachSize, "AttachSize", Integer32),
    prop!(TagAttachNumber, "AttachNumber", Integer32),
    prop!(TagPrimarySendAccount, "PrimarySendAccount", String),
    prop!(TagAccess, "Access", Integer32),
    prop!(TagInstanceKey, "InstanceKey", Binary),
    prop!(TagAccessLevel, "AccessLevel", Integer32),
    prop!(TagRecordKey, "RecordKey", Binary),
    prop!(TagObjectType, "ObjectType", Integer32),
    prop!(TagEntryId, "EntryId", Binary),
    prop!(TagBody, "Body", String),
    prop!(TagRtfCompressed, "RtfCompressed", Binary),
    prop!(TagBodyHtml, "BodyHtml", Binary),
    prop!(TagNativeBody, "NativeBody", Integer32),
    prop!(TagInternetMessageId, "InternetMessageId", String),
    prop!(TagInReplyToId, "InReplyToId", String),
    prop!(TagIconIndex, "IconIndex", Integer32),
    prop!(TagLastVerbExecuted, "LastVerbExecuted", Integer32),
    prop!(TagFlagStatus, "FlagStatus", Integer32),
    prop!(TagFlagCompleteTime, "FlagCompleteTime", Time),
    prop!(TagRowid, "Rowid", Integer32),
    prop!(TagDisplayName, "DisplayName", String),
    prop!(TagAddressType, "AddressType", String),
    prop!(TagEmailAddress, "EmailAddress", String),
    prop!(TagComment, "Comment", String),
    prop!(TagCreationTime, "CreationTime", Time),
    prop!(TagLastModificationTime, "LastModificationTime", Time),
    prop!(TagSearchKey, "SearchKey", Binary),
    prop!(TagStoreSupportMask, "StoreSupportMask", Integer32),
    prop!(TagAttachDataBinary, "AttachData", Binary),
    prop!(TagAttachEncoding, "AttachEncoding", Binary),
    prop!(TagAttachExtension, "AttachExtension", String),
    prop!(TagAttachFilename, "AttachFilename", String),
    prop!(TagAttachMethod, "AttachMethod", Integer32),
    prop!(TagAttachLongFilename, "AttachLongFilename", String),
    prop!(TagAttachPathname, "AttachPathname", String),
    prop!(TagAttachRendering, "AttachRendering", Binary),
    prop!(TagAttachTag, "AttachTag", Binary),
    prop!(TagRenderingPosition, "RenderingPosition", Integer32),
    prop!(TagAttachLongPathname, "AttachLongPathname", String),
    prop!(TagAttachMimeTag, "AttachMimeTag", String),
    prop!(TagAttachContentId, "AttachContentId", String),
    prop!(TagAttachContentLocation, "AttachContentLocation", String),
    prop!(TagAttachFlags, "AttachFlags", Integer32),
    prop!(TagDisplayType, "DisplayType", Integer32),
    prop!(TagSmtpAddress, "SmtpAddress", String),
    prop!(TagTransmittableDisplayName, "TransmittableDisplayName", String),
    prop!(TagSendRichInfo, "SendRichInfo", Boolean),
    prop!(TagInternetCodepage, "InternetCodepage", Integer32),
    prop!(TagMessageLocaleId, "MessageLocaleId", Integer32),
    prop!(TagCreatorName, "CreatorName", String),
    prop!(TagLastModifierName, "LastModifierName", String),
    prop!(TagMessageCodepage, "MessageCodepage", Integer32),
    prop!(TagEmail2, "Email2", String),
    prop!(TagSenderSmtpAddress, "SenderSmtpAddress", String),
    prop!(TagSentRepresentingSmtpAddress, "SentRepresentingSmtpAddress", String),
    prop!(TagRecipientDisplayName, "RecipientDisplayName", String),
    prop!(TagRecipientTrackStatus, "RecipientTrackStatus", Integer32),
    prop!(TagAttachmentHidden, "AttachmentHidden", Boolean),
];

static NAMED_PROPERTIES: &[NamedPropertyInfo] = &[
    named!(PS_PUBLIC_STRINGS, name "Keywords", "Keywords", MultipleString),
    named!(PSETID_COMMON, id 0x8502, "ReminderTime", Time),
    named!(PSETID_COMMON, id 0x8503, "ReminderSet", Boolean),
    named!(PSETID_COMMON, id 0x8530, "FlagRequest", String),
    named!(PSETID_COMMON, id 0x8539, "Companies", MultipleString),
    named!(PSETID_COMMON, id 0x853A, "Contacts", MultipleString),
    named!(PSETID_TASK, id 0x8101, "TaskStatus", Integer32),
    named!(PSETID_TASK, id 0x8102, "PercentComplete", Floating64),
    named!(PSETID_TASK, id 0x8104, "TaskStartDate", Time),
    named!(PSETID_TASK, id 0x8105, "TaskDueDate", Time),
    named!(PSETID_TASK, id 0x811C, "TaskComplete", Boolean),
    named!(PSETID_TASK, id 0x8121, "TaskAssigner", String),
    named!(PSETID_APPOINTMENT, id 0x8205, "BusyStatus", Integer32),
    named!(PSETID_APPOINTMENT, id 0x8208, "Location", String),
    named!(PSETID_APPOINTMENT, id 0x820D, "AppointmentStartWhole", Time),
    named!(PSETID_APPOINTMENT, id 0x820E, "AppointmentEndWhole", Time),
    named!(PSETID_APPOINTMENT, id 0x8223, "Recurring", Boolean),
    named!(PSETID_APPOINTMENT, id 0x8231, "RecurrenceType", Integer32),
    named!(PSETID_APPOINTMENT, id 0x8232, "RecurrencePattern", String),
    named!(PSETID_APPOINTMENT, id 0x8238, "AllAttendeesString", String),
    named!(PSETID_ADDRESS, id 0x8080, "Email1DisplayName", String),
    named!(PSETID_ADDRESS, id 0x8083, "Email1EmailAddress", String),
    named!(PSETID_MEETING, id 0x0023, "GlobalObjectId", Binary),
];


static BY_ID: Lazy<BTreeMap<u16, &'static PropertyInfo>> = Lazy::new(|| {
    PROPERTIES.iter()
        .map(|info| (info.id(), info))
        .collect()
});
static BY_NAME: Lazy<HashMap<&'static str, &'static PropertyInfo>> = Lazy::new(|| {
    PROPERTIES.iter()
        .map(|info| (info.name, info))
        .collect()
});
static NAMED_BY_IDENTITY: Lazy<HashMap<NamedProperty, &'static NamedPropertyInfo>> = Lazy::new(|| {
    NAMED_PROPERTIES.iter()
        .map(|info| (info.named_property(), info))
        .collect()
});


/// All well-known numeric properties.
pub fn properties() -> &'static [PropertyInfo] {
    PROPERTIES
}

/// All well-known named properties.
pub fn named_properties() -> &'static [NamedPropertyInfo] {
    NAMED_PROPERTIES
}

/// Looks up a property by numeric id alone.
pub fn lookup(id: u16) -> Option<&'static PropertyInfo> {
    BY_ID.get(&id).copied()
}

/// Looks up a property by id and value type. The type has to agree with the
/// catalog entry; 8-bit and Unicode strings are interchangeable, and object
/// data may stand in for binary data.
pub fn lookup_tag(tag: PropertyTag) -> Option<&'static PropertyInfo> {
    let info = lookup(tag.id)?;
    if types_compatible(info.prop_type, tag.prop_type()) {
        Some(info)
    } else {
        None
    }
}

/// Looks up a property by its symbolic name, e.g. `"Subject"`.
pub fn lookup_name(name: &str) -> Option<&'static PropertyInfo> {
    BY_NAME.get(name).copied()
}

pub fn lookup_named(named: &NamedProperty) -> Option<&'static NamedPropertyInfo> {
    NAMED_BY_IDENTITY.get(named).copied()
}

/// Looks up a named property by its symbolic name, e.g. `"TaskDueDate"`.
pub fn lookup_named_by_name(name: &str) -> Option<&'static NamedPropertyInfo> {
    NAMED_PROPERTIES.iter()
        .find(|info| info.name == name)
}

/// Symbolic name of a named property. String-named properties are their own
/// name; numerically named ones need a catalog entry.
pub fn named_property_name(named: &NamedProperty) -> Option<&str> {
    if let Some(info) = lookup_named(named) {
        return Some(info.name);
    }
    match &named.name {
        PropertyNameInfo::Name(name) => Some(name.as_str()),
        PropertyNameInfo::DisplayId(_) => None,
    }
}

fn types_compatible(expected: PropType, actual: PropType) -> bool {
    if expected == actual {
        return true;
    }
    match (expected, actual) {
        (PropType::String, PropType::String8)|(PropType::String8, PropType::String) => true,
        (PropType::MultipleString, PropType::MultipleString8)|(PropType::MultipleString8, PropType::MultipleString) => true,
        (PropType::Binary, PropType::Object) => true,
        _ => false,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lookup_is_total_and_stable() {
        for info in properties() {
            let first = lookup(info.id()).expect("catalog entry must be found by its id");
            let second = lookup(info.id()).unwrap();
            assert_eq!(first.name, second.name);
            assert_eq!(first.name, info.name);
        }
    }

    #[test]
    fn test_ids_and_names_are_unique() {
        let ids: HashSet<u16> = properties().iter().map(|p| p.id()).collect();
        assert_eq!(ids.len(), properties().len());
        let names: HashSet<&str> = properties().iter().map(|p| p.name).collect();
        assert_eq!(names.len(), properties().len());
    }

    #[test]
    fn test_lookup_tag_type_agreement() {
        let subject8 = PropertyTag::new(0x0037, PropType::String8);
        assert_eq!(lookup_tag(subject8).map(|i| i.name), Some("Subject"));
        let subject_int = PropertyTag::new(0x0037, PropType::Integer32);
        assert!(lookup_tag(subject_int).is_none());
        let attach_object = PropertyTag::new(0x3701, PropType::Object);
        assert_eq!(lookup_tag(attach_object).map(|i| i.name), Some("AttachData"));
    }

    #[test]
    fn test_unknown_ids() {
        assert!(lookup(0x6601).is_none());
        assert!(lookup(0x8001).is_none());
        assert!(lookup_name("NoSuchProperty").is_none());
    }

    #[test]
    fn test_lookup_name() {
        let info = lookup_name("AttachMethod").unwrap();
        assert_eq!(info.id(), 0x3705);
        assert_eq!(info.prop_type, PropType::Integer32);
    }

    #[test]
    fn test_named_lookup() {
        let due = NamedProperty::with_id(PSETID_TASK, 0x8105);
        assert_eq!(named_property_name(&due), Some("TaskDueDate"));

        let custom = NamedProperty::with_name(Uuid::nil(), "X-Custom");
        assert_eq!(named_property_name(&custom), Some("X-Custom"));

        let unknown = NamedProperty::with_id(Uuid::nil(), 0x1234);
        assert_eq!(named_property_name(&unknown), None);

        let keywords = lookup_named_by_name("Keywords").unwrap().named_property();
        assert_eq!(keywords, NamedProperty::with_name(PS_PUBLIC_STRINGS, "Keywords"));
    }
}
