use std::fmt;
use std::str::FromStr;

use crate::error::ForwardError;

/// Object a tunnel points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectRef {
    /// A service; one of its ready backing pods is used
    Service(String),
    /// A specific pod
    Pod(String),
}

impl ObjectRef {
    pub fn name(&self) -> &str {
        match self {
            ObjectRef::Service(name) | ObjectRef::Pod(name) => name,
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectRef::Service(name) => write!(f, "svc/{}", name),
            ObjectRef::Pod(name) => write!(f, "pod/{}", name),
        }
    }
}

impl FromStr for ObjectRef {
    type Err = ForwardError;

    /// Parse kubectl style references (`svc/NAME`, `pod/NAME`, `NAME`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ForwardError::InvalidTarget {
            reference: s.to_string(),
            reason: reason.to_string(),
        };

        let (kind, name) = match s.split_once('/') {
            Some((kind, name)) => (Some(kind), name),
            None => (None, s),
        };

        if name.is_empty() {
            return Err(invalid("missing name"));
        }
        if name.contains('/') {
            return Err(invalid("expected KIND/NAME"));
        }

        match kind.map(str::to_ascii_lowercase).as_deref() {
            None | Some("po") | Some("pod") | Some("pods") => Ok(ObjectRef::Pod(name.to_string())),
            Some("svc") | Some("service") | Some("services") => {
                Ok(ObjectRef::Service(name.to_string()))
            }
            Some(_) => Err(invalid("only services and pods can be forwarded")),
        }
    }
}

/// One requested tunnel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardTarget {
    pub object: ObjectRef,
    pub namespace: String,
    /// Port on the service or pod
    pub remote_port: u16,
    /// Local port to bind, 0 picks a free one
    pub local_port: u16,
}

impl ForwardTarget {
    pub fn new(object: ObjectRef, namespace: impl Into<String>, remote_port: u16) -> Self {
        Self {
            object,
            namespace: namespace.into(),
            remote_port,
            local_port: 0,
        }
    }

    /// Build a target from a reference like `svc/policy-reporter`
    pub fn parse(
        reference: &str,
        namespace: impl Into<String>,
        remote_port: u16,
    ) -> Result<Self, ForwardError> {
        Ok(Self::new(reference.parse()?, namespace, remote_port))
    }

    /// Pin the local port instead of letting the system choose
    pub fn with_local_port(mut self, port: u16) -> Self {
        self.local_port = port;
        self
    }
}

impl fmt::Display for ForwardTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in namespace {} port {}",
            self.object, self.namespace, self.remote_port
        )
    }
}

/// A concrete pod port a target resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub namespace: String,
    pub pod: String,
    pub port: u16,
}

impl fmt::Display for ResolvedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.namespace, self.pod, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_service_aliases() {
        for reference in [
            "svc/policy-reporter",
            "service/policy-reporter",
            "Services/policy-reporter",
        ] {
            assert_eq!(
                reference.parse::<ObjectRef>().unwrap(),
                ObjectRef::Service("policy-reporter".into())
            );
        }
    }

    #[test]
    fn test_parse_pod_and_bare_name() {
        assert_eq!("po/web-0".parse::<ObjectRef>().unwrap(), ObjectRef::Pod("web-0".into()));
        assert_eq!("web-0".parse::<ObjectRef>().unwrap(), ObjectRef::Pod("web-0".into()));
    }

    #[test]
    fn test_parse_rejects_invalid() {
        for reference in ["", "svc/", "deployment/web", "svc/a/b"] {
            assert!(
                matches!(
                    reference.parse::<ObjectRef>(),
                    Err(ForwardError::InvalidTarget { .. })
                ),
                "{} should be rejected",
                reference
            );
        }
    }

    #[test]
    fn test_target_display() {
        let target = ForwardTarget::parse("svc/policy-reporter", "policy-reporter", 8080).unwrap();
        assert_eq!(target.local_port, 0);
        assert_eq!(
            target.to_string(),
            "svc/policy-reporter in namespace policy-reporter port 8080"
        );
        assert_eq!(target.with_local_port(9000).local_port, 9000);
    }
}
