//! JVM access flags shared by classes, fields and methods.
//!
//! The class file format reuses the same bit positions for the flags the
//! weaver cares about, so one set covers all three. Bits this type does not
//! name (`ACC_MODULE` / `ACC_MANDATED` at 0x8000) are kept as-is by
//! [`AccessFlags::from_bits_retain`].

use bitflags::bitflags;
use std::fmt;

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct AccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        /// `ACC_SUPER` on classes, `ACC_SYNCHRONIZED` on methods.
        const SUPER = 0x0020;
        const VOLATILE = 0x0040;
        const TRANSIENT = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
    }
}

impl AccessFlags {
    /// Flags that restrict visibility below package-private.
    pub const RESTRICTED: AccessFlags = AccessFlags::PRIVATE.union(AccessFlags::PROTECTED);

    pub fn is_public(self) -> bool {
        self.contains(AccessFlags::PUBLIC)
    }

    pub fn is_private(self) -> bool {
        self.contains(AccessFlags::PRIVATE)
    }

    pub fn is_final(self) -> bool {
        self.contains(AccessFlags::FINAL)
    }

    pub fn is_interface(self) -> bool {
        self.contains(AccessFlags::INTERFACE)
    }

    /// Class-level widening: drop private/protected and force public.
    pub fn widened_to_public(self) -> AccessFlags {
        self.difference(AccessFlags::RESTRICTED) | AccessFlags::PUBLIC
    }

    /// Member-level widening: drop private/protected and final so generated
    /// code in the same package can assign or invoke the member.
    pub fn opened_for_injection(self) -> AccessFlags {
        self.difference(AccessFlags::RESTRICTED | AccessFlags::FINAL)
    }
}

impl fmt::Display for AccessFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(AccessFlags::PUBLIC) {
            names.push("public");
        }
        if self.contains(AccessFlags::PRIVATE) {
            names.push("private");
        }
        if self.contains(AccessFlags::PROTECTED) {
            names.push("protected");
        }
        if self.contains(AccessFlags::STATIC) {
            names.push("static");
        }
        if self.contains(AccessFlags::FINAL) {
            names.push("final");
        }
        if self.contains(AccessFlags::ABSTRACT) {
            names.push("abstract");
        }
        write!(f, "{} (0x{:04x})", names.join(" "), self.bits())
    }
}
