//! Syslog Sources
//!
//! RFC 3164 (BSD syslog) over UDP. Wire parsing is delegated to
//! `syslog_loose`; this module only maps its output onto record fields.

pub mod decode;
pub mod udp;

pub use decode::{decode_datagram, trim_trailing_newline};
pub use udp::{
    SyslogUdpMetricsHandle, SyslogUdpSource, SyslogUdpSourceError, SyslogUdpSourceMetrics,
};
