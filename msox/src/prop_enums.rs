use from_to_repr::from_to_other;


/// Well-known (non-named) property ids.
///
/// Ids that share a value with an earlier variant are listed as comments.
#[derive(Clone, Copy, Debug)]
#[from_to_other(base_type = u16, derive_compare = "as_int")]
pub enum PropTag {
    TagImportance = 0x0017,
    TagMessageClass = 0x001A,
    TagOriginatorDeliveryReportRequested = 0x0023,
    TagPriority = 0x0026,
    TagReadReceiptRequested = 0x0029,
    TagSensitivity = 0x0036,
    TagSubject = 0x0037,
    TagClientSubmitTime = 0x0039,
    TagSentRepresentingSearchKey = 0x003B,
    TagSubjectPrefix = 0x003D,
    TagReceivedByEntryId = 0x003F,
    TagReceivedByName = 0x0040,
    TagSentRepresentingEntryId = 0x0041,
    TagSentRepresentingName = 0x0042,
    TagMessageSubmissionId = 0x0047,
    TagProviderSubmitTime = 0x0048,
    TagReplyRecipientNames = 0x0050,
    TagSentRepresentingAddressType = 0x0064,
    TagSentRepresentingEmailAddress = 0x0065,
    TagConversationTopic = 0x0070,
    TagConversationIndex = 0x0071,
    TagTransportMessageHeaders = 0x007D,
    TagRecipientType = 0x0C15,
    TagSenderEntryId = 0x0C19,
    TagSenderName = 0x0C1A,
    TagSenderSearchKey = 0x0C1D,
    TagSenderAddressType = 0x0C1E,
    TagSenderEmailAddress = 0x0C1F,
    TagDisplayBcc = 0x0E02,
    TagDisplayCc = 0x0E03,
    TagDisplayTo = 0x0E04,
    TagMessageDeliveryTime = 0x0E06,
    TagMessageFlags = 0x0E07,
    TagMessageSize = 0x0E08,
    TagHasAttachments = 0x0E1B,
    TagNormalizedSubject = 0x0E1D,
    TagRtfInSync = 0x0E1F,
    TagAttachSize = 0x0E20,
    TagAttachNumber = 0x0E21,
    TagPrimarySendAccount = 0x0E28,
    TagAccess = 0x0FF4,
    TagInstanceKey = 0x0FF6,
    TagAccessLevel = 0x0FF7,
    TagRecordKey = 0x0FF9,
    TagObjectType = 0x0FFE,
    TagEntryId = 0x0FFF,
    TagBody = 0x1000,
    TagRtfCompressed = 0x1009,
    TagBodyHtml = 0x1013,
    // TagHtml = TagBodyHtml
    TagNativeBody = 0x1016,
    TagInternetMessageId = 0x1035,
    TagInReplyToId = 0x1042,
    TagIconIndex = 0x1080,
    TagLastVerbExecuted = 0x1081,
    TagFlagStatus = 0x1090,
    TagFlagCompleteTime = 0x1091,
    TagRowid = 0x3000,
    TagDisplayName = 0x3001,
    TagAddressType = 0x3002,
    TagEmailAddress = 0x3003,
    TagComment = 0x3004,
    TagCreationTime = 0x3007,
    TagLastModificationTime = 0x3008,
    TagSearchKey = 0x300B,
    TagStoreSupportMask = 0x340D,
    TagAttachDataBinary = 0x3701,
    // TagAttachDataObject = TagAttachDataBinary
    TagAttachEncoding = 0x3702,
    TagAttachExtension = 0x3703,
    TagAttachFilename = 0x3704,
    TagAttachMethod = 0x3705,
    TagAttachLongFilename = 0x3707,
    TagAttachPathname = 0x3708,
    TagAttachRendering = 0x3709,
    TagAttachTag = 0x370A,
    TagRenderingPosition = 0x370B,
    TagAttachLongPathname = 0x370D,
    TagAttachMimeTag = 0x370E,
    TagAttachContentId = 0x3712,
    TagAttachContentLocation = 0x3713,
    TagAttachFlags = 0x3714,
    TagDisplayType = 0x3900,
    TagSmtpAddress = 0x39FE,
    TagTransmittableDisplayName = 0x3A20,
    TagSendRichInfo = 0x3A40,
    TagInternetCodepage = 0x3FDE,
    TagMessageLocaleId = 0x3FF1,
    TagCreatorName = 0x3FF8,
    TagLastModifierName = 0x3FFA,
    TagMessageCodepage = 0x3FFD,
    TagEmail2 = 0x403E,
    TagSenderSmtpAddress = 0x5D01,
    TagSentRepresentingSmtpAddress = 0x5D02,
    TagRecipientDisplayName = 0x5FF6,
    TagRecipientTrackStatus = 0x5FFF,
    TagAttachmentHidden = 0x7FFE,
    Other(u16),
}
