//! Property attribute flags shared by data and accessor descriptors.

use bitflags::bitflags;

bitflags! {
    /// `writable`/`enumerable`/`configurable`, packed into one byte so a
    /// descriptor's flags are cheap to copy and compare. `WRITABLE` is
    /// meaningless on an accessor descriptor and ignored there.
    #[derive(Default)]
    pub struct Attribute: u8 {
        const WRITABLE     = 0b0000_0001;
        const ENUMERABLE   = 0b0000_0010;
        const CONFIGURABLE = 0b0000_0100;
    }
}

impl Attribute {
    /// `{ writable: true, enumerable: true, configurable: true }`, the
    /// default for most data properties created from JS source.
    pub fn all() -> Self {
        Self::WRITABLE | Self::ENUMERABLE | Self::CONFIGURABLE
    }

    /// `{ writable: true, enumerable: false, configurable: true }`, the
    /// attributes spec.md gives built-in methods and accessors.
    pub fn builtin() -> Self {
        Self::WRITABLE | Self::CONFIGURABLE
    }

    pub fn writable(self) -> bool {
        self.contains(Self::WRITABLE)
    }
    pub fn enumerable(self) -> bool {
        self.contains(Self::ENUMERABLE)
    }
    pub fn configurable(self) -> bool {
        self.contains(Self::CONFIGURABLE)
    }

    pub fn set_writable(&mut self, value: bool) {
        self.set(Self::WRITABLE, value);
    }
    pub fn set_enumerable(&mut self, value: bool) {
        self.set(Self::ENUMERABLE, value);
    }
    pub fn set_configurable(&mut self, value: bool) {
        self.set(Self::CONFIGURABLE, value);
    }
}
