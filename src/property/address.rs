//! Property addresses and the host's four-character vocabulary

use std::fmt;

use crate::error::four_cc;

fn write_four_cc(f: &mut fmt::Formatter<'_>, code: u32) -> fmt::Result {
    let bytes = code.to_be_bytes();
    if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        write!(f, "'{}'", String::from_utf8_lossy(&bytes))
    } else {
        write!(f, "{code:#010x}")
    }
}

/// Property selector (`AudioObjectPropertySelector`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selector(pub u32);

impl Selector {
    // AudioObject
    /// `kAudioObjectPropertyBaseClass`
    pub const BASE_CLASS: Self = Self(four_cc(b"bcls"));
    /// `kAudioObjectPropertyClass`
    pub const CLASS: Self = Self(four_cc(b"clas"));
    /// `kAudioObjectPropertyOwner`
    pub const OWNER: Self = Self(four_cc(b"stdv"));
    /// `kAudioObjectPropertyName`
    pub const NAME: Self = Self(four_cc(b"lnam"));
    /// `kAudioObjectPropertyManufacturer`
    pub const MANUFACTURER: Self = Self(four_cc(b"lmak"));
    /// `kAudioObjectPropertyOwnedObjects`
    pub const OWNED_OBJECTS: Self = Self(four_cc(b"ownd"));
    /// `kAudioObjectPropertyControlList`
    pub const CONTROL_LIST: Self = Self(four_cc(b"ctrl"));

    // PlugIn
    /// `kAudioPlugInPropertyDeviceList`
    pub const DEVICE_LIST: Self = Self(four_cc(b"dev#"));
    /// `kAudioPlugInPropertyTranslateUIDToDevice`
    pub const TRANSLATE_UID_TO_DEVICE: Self = Self(four_cc(b"uidd"));
    /// `kAudioPlugInPropertyResourceBundle`
    pub const RESOURCE_BUNDLE: Self = Self(four_cc(b"rsrc"));

    // Device
    /// `kAudioDevicePropertyDeviceUID`
    pub const DEVICE_UID: Self = Self(four_cc(b"uid "));
    /// `kAudioDevicePropertyModelUID`
    pub const MODEL_UID: Self = Self(four_cc(b"muid"));
    /// `kAudioDevicePropertyTransportType`
    pub const TRANSPORT_TYPE: Self = Self(four_cc(b"tran"));
    /// `kAudioDevicePropertyRelatedDevices`
    pub const RELATED_DEVICES: Self = Self(four_cc(b"akin"));
    /// `kAudioDevicePropertyClockDomain`
    pub const CLOCK_DOMAIN: Self = Self(four_cc(b"clkd"));
    /// `kAudioDevicePropertyDeviceIsAlive`
    pub const DEVICE_IS_ALIVE: Self = Self(four_cc(b"livn"));
    /// `kAudioDevicePropertyDeviceIsRunning`
    pub const DEVICE_IS_RUNNING: Self = Self(four_cc(b"goin"));
    /// `kAudioDevicePropertyDeviceCanBeDefaultDevice`
    pub const CAN_BE_DEFAULT_DEVICE: Self = Self(four_cc(b"dflt"));
    /// `kAudioDevicePropertyDeviceCanBeDefaultSystemDevice`
    pub const CAN_BE_DEFAULT_SYSTEM_DEVICE: Self = Self(four_cc(b"sflt"));
    /// `kAudioDevicePropertyLatency` (also used on streams)
    pub const LATENCY: Self = Self(four_cc(b"ltnc"));
    /// `kAudioDevicePropertyStreams`
    pub const STREAMS: Self = Self(four_cc(b"stm#"));
    /// `kAudioDevicePropertySafetyOffset`
    pub const SAFETY_OFFSET: Self = Self(four_cc(b"saft"));
    /// `kAudioDevicePropertyNominalSampleRate`
    pub const NOMINAL_SAMPLE_RATE: Self = Self(four_cc(b"nsrt"));
    /// `kAudioDevicePropertyAvailableNominalSampleRates`
    pub const AVAILABLE_NOMINAL_SAMPLE_RATES: Self = Self(four_cc(b"nsr#"));
    /// `kAudioDevicePropertyIsHidden`
    pub const IS_HIDDEN: Self = Self(four_cc(b"hidn"));
    /// `kAudioDevicePropertyZeroTimeStampPeriod`
    pub const ZERO_TIME_STAMP_PERIOD: Self = Self(four_cc(b"ring"));
    /// `kAudioDevicePropertyBufferFrameSize`
    pub const BUFFER_FRAME_SIZE: Self = Self(four_cc(b"fsiz"));
    /// `kAudioDevicePropertyBufferFrameSizeRange`
    pub const BUFFER_FRAME_SIZE_RANGE: Self = Self(four_cc(b"fsz#"));
    /// `kAudioDevicePropertyPreferredChannelsForStereo`
    pub const PREFERRED_CHANNELS_FOR_STEREO: Self = Self(four_cc(b"dch2"));
    /// Per-process fader; qualifier is a pid, data an `f32` gain
    pub const CLIENT_GAIN: Self = Self(four_cc(b"fadr"));

    // Stream
    /// `kAudioStreamPropertyIsActive`
    pub const STREAM_IS_ACTIVE: Self = Self(four_cc(b"sact"));
    /// `kAudioStreamPropertyDirection`
    pub const STREAM_DIRECTION: Self = Self(four_cc(b"sdir"));
    /// `kAudioStreamPropertyTerminalType`
    pub const STREAM_TERMINAL_TYPE: Self = Self(four_cc(b"term"));
    /// `kAudioStreamPropertyStartingChannel`
    pub const STREAM_STARTING_CHANNEL: Self = Self(four_cc(b"schn"));
    /// `kAudioStreamPropertyVirtualFormat`
    pub const STREAM_VIRTUAL_FORMAT: Self = Self(four_cc(b"sfmt"));
    /// `kAudioStreamPropertyAvailableVirtualFormats`
    pub const STREAM_AVAILABLE_VIRTUAL_FORMATS: Self = Self(four_cc(b"sfma"));
    /// `kAudioStreamPropertyPhysicalFormat`
    pub const STREAM_PHYSICAL_FORMAT: Self = Self(four_cc(b"pft "));
    /// `kAudioStreamPropertyAvailablePhysicalFormats`
    pub const STREAM_AVAILABLE_PHYSICAL_FORMATS: Self = Self(four_cc(b"pfta"));
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_four_cc(f, self.0)
    }
}

/// Property scope (`AudioObjectPropertyScope`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope(pub u32);

impl Scope {
    /// `kAudioObjectPropertyScopeGlobal`
    pub const GLOBAL: Self = Self(four_cc(b"glob"));
    /// `kAudioObjectPropertyScopeInput`
    pub const INPUT: Self = Self(four_cc(b"inpt"));
    /// `kAudioObjectPropertyScopeOutput`
    pub const OUTPUT: Self = Self(four_cc(b"outp"));
    /// `kAudioObjectPropertyScopePlayThrough`
    pub const PLAY_THROUGH: Self = Self(four_cc(b"ptru"));
    /// `kAudioObjectPropertyScopeWildcard`
    pub const WILDCARD: Self = Self(four_cc(b"****"));
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_four_cc(f, self.0)
    }
}

/// Property element (`AudioObjectPropertyElement`)
pub type Element = u32;

/// `kAudioObjectPropertyElementMain`
pub const ELEMENT_MAIN: Element = 0;

/// Class identifiers reported through `Class` / `BaseClass`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub u32);

impl ClassId {
    /// `kAudioObjectClassID`
    pub const OBJECT: Self = Self(four_cc(b"aobj"));
    /// `kAudioPlugInClassID`
    pub const PLUGIN: Self = Self(four_cc(b"aplg"));
    /// `kAudioDeviceClassID`
    pub const DEVICE: Self = Self(four_cc(b"adev"));
    /// `kAudioStreamClassID`
    pub const STREAM: Self = Self(four_cc(b"astr"));
}

/// `kAudioDeviceTransportTypeVirtual`
pub const TRANSPORT_TYPE_VIRTUAL: u32 = four_cc(b"virt");
/// `kAudioStreamTerminalTypeLine`
pub const TERMINAL_TYPE_LINE: u32 = four_cc(b"line");

/// (selector, scope, element) triple naming one property of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyAddress {
    /// What is being asked about
    pub selector: Selector,
    /// Input, output or global view
    pub scope: Scope,
    /// Channel element (0 = main)
    pub element: Element,
}

impl PropertyAddress {
    /// Create an address
    #[must_use]
    pub fn new(selector: Selector, scope: Scope, element: Element) -> Self {
        Self {
            selector,
            scope,
            element,
        }
    }

    /// Global-scope, main-element address
    #[must_use]
    pub fn global(selector: Selector) -> Self {
        Self::new(selector, Scope::GLOBAL, ELEMENT_MAIN)
    }

    /// Address with the given scope and main element
    #[must_use]
    pub fn scoped(selector: Selector, scope: Scope) -> Self {
        Self::new(selector, scope, ELEMENT_MAIN)
    }
}

impl fmt::Display for PropertyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.selector, self.scope, self.element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_display() {
        assert_eq!(Selector::NOMINAL_SAMPLE_RATE.to_string(), "'nsrt'");
        assert_eq!(Selector::DEVICE_UID.to_string(), "'uid '");
        assert_eq!(Selector(1).to_string(), "0x00000001");
    }

    #[test]
    fn test_address_display() {
        let address = PropertyAddress::scoped(Selector::STREAMS, Scope::OUTPUT);
        assert_eq!(address.to_string(), "'stm#'/'outp'/0");
    }

    #[test]
    fn test_shared_selector_values() {
        assert_eq!(Selector::ZERO_TIME_STAMP_PERIOD.0, 0x7269_6E67);
        assert_eq!(Scope::GLOBAL.0, 0x676C_6F62);
    }
}
