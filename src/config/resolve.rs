//! Key lookup against a parsed document
// (c) 2024 Ross Younger

use std::str::FromStr;

use super::{
    document::{Document, HostBlock, KeyValue, Node},
    errors::{Error, Result},
    matching::evaluate_host_match,
    BlockKind,
};

/// Directives for which every occurrence applies, rather than only the first.
/// (Lowercase!)
const CUMULATIVE_KEYS: &[&str] = &[
    "certificatefile",
    "dynamicforward",
    "identityfile",
    "localforward",
    "remoteforward",
    "sendenv",
    "setenv",
];

/// Directives whose values must be unsigned integers.
/// (Lowercase!)
const UNSIGNED_KEYS: &[&str] = &[
    "canonicalizemaxdots",
    "compressionlevel",
    "connectionattempts",
    "numberofpasswordprompts",
    "port",
    "serveralivecountmax",
    "serveraliveinterval",
];

/// Does this directive accumulate values from every matching block?
#[must_use]
pub fn supports_multiple(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    CUMULATIVE_KEYS.contains(&key.as_str())
}

/// Checks the value of a directive that must be numeric.
/// Values of other directives are not checked.
pub(crate) fn validate(key: &str, value: &str) -> Result<()> {
    let lower = key.to_ascii_lowercase();
    if UNSIGNED_KEYS.contains(&lower.as_str()) {
        let _ = parse_value::<u64>(key, value)?;
    }
    Ok(())
}

/// Parses a resolved value, keeping the details if that fails
pub(crate) fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| Error::ValueConversion {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

impl HostBlock {
    /// Does this block apply to the given host alias?
    ///
    /// `Match` blocks never do.
    #[must_use]
    pub fn matches(&self, alias: &str) -> bool {
        self.kind == BlockKind::Host && evaluate_host_match(alias, &self.patterns)
    }
}

/// Walks a node list in document order, collecting directives named `key`.
/// Returns true once the search is complete.
fn collect<'a>(
    nodes: &'a [Node],
    alias: &str,
    key: &str,
    cumulative: bool,
    output: &mut Vec<&'a KeyValue>,
) -> bool {
    for node in nodes {
        let done = match node {
            Node::KeyValue(kv) if kv.is(key) => {
                output.push(kv);
                !cumulative
            }
            Node::Include(inc) => inc
                .documents
                .iter()
                .any(|doc| collect(&doc.nodes, alias, key, cumulative, output)),
            Node::Host(block) if block.matches(alias) => {
                collect(&block.nodes, alias, key, cumulative, output)
            }
            _ => false,
        };
        if done {
            return true;
        }
    }
    false
}

impl Document {
    /// Visits every directive that applies to `alias`, in document order, descending into includes
    pub(crate) fn for_each_applicable<'a, F>(&'a self, alias: &str, f: &mut F)
    where
        F: FnMut(&'a Document, &'a KeyValue),
    {
        fn walk<'a, F>(doc: &'a Document, nodes: &'a [Node], alias: &str, f: &mut F)
        where
            F: FnMut(&'a Document, &'a KeyValue),
        {
            for node in nodes {
                match node {
                    Node::KeyValue(kv) => f(doc, kv),
                    Node::Include(inc) => {
                        for sub in &inc.documents {
                            walk(sub, &sub.nodes, alias, f);
                        }
                    }
                    Node::Host(block) if block.matches(alias) => {
                        walk(doc, &block.nodes, alias, f);
                    }
                    _ => (),
                }
            }
        }
        walk(self, &self.nodes, alias, f);
    }

    /// All directives that supply a value for `key` for this `alias`, honouring
    /// first-match-wins or cumulative semantics as appropriate for the key.
    #[must_use]
    pub fn directives_for(&self, alias: &str, key: &str) -> Vec<&KeyValue> {
        let mut output = Vec::new();
        let _ = collect(&self.nodes, alias, key, supports_multiple(key), &mut output);
        output
    }

    /// Looks up the value of `key` for `alias`.
    /// Returns an empty string if it is not set.
    ///
    /// Keys are case-insensitive. Directives outside any `Host` block apply to every alias.
    #[must_use]
    pub fn get(&self, alias: &str, key: &str) -> String {
        self.directives_for(alias, key)
            .first()
            .map(|kv| kv.value().to_string())
            .unwrap_or_default()
    }

    /// Looks up all values of `key` for `alias`.
    ///
    /// For most keys there is at most one value (the first one found).
    /// For keys that [`supports_multiple`], this is every value from every matching block.
    #[must_use]
    pub fn get_all(&self, alias: &str, key: &str) -> Vec<String> {
        self.directives_for(alias, key)
            .iter()
            .map(|kv| kv.value().to_string())
            .collect()
    }

    /// As [`get`](Self::get), but splits the value into its arguments (removing quotes).
    #[must_use]
    pub fn get_splits(&self, alias: &str, key: &str) -> Vec<String> {
        self.directives_for(alias, key)
            .first()
            .map(|kv| kv.args().to_vec())
            .unwrap_or_default()
    }

    /// As [`get_all`](Self::get_all), but splits every value into its arguments (removing quotes).
    #[must_use]
    pub fn get_all_splits(&self, alias: &str, key: &str) -> Vec<String> {
        self.directives_for(alias, key)
            .iter()
            .flat_map(|kv| kv.args().iter().cloned())
            .collect()
    }

    /// As [`get`](Self::get), but checks the values of numeric directives
    pub fn get_strict(&self, alias: &str, key: &str) -> Result<String> {
        let value = self.get(alias, key);
        if !value.is_empty() {
            validate(key, &value)?;
        }
        Ok(value)
    }

    /// As [`get_all`](Self::get_all), but checks the values of numeric directives
    pub fn get_all_strict(&self, alias: &str, key: &str) -> Result<Vec<String>> {
        let values = self.get_all(alias, key);
        for v in &values {
            validate(key, v)?;
        }
        Ok(values)
    }

    /// Looks up a value and converts it to a given type.
    /// Returns `None` if the key is not set.
    pub fn get_as<T>(&self, alias: &str, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.get(alias, key);
        if value.is_empty() {
            return Ok(None);
        }
        parse_value(key, &value).map(Some)
    }

    /// Convenience wrapper: the port to use for a host, if set
    pub fn get_port(&self, alias: &str) -> Result<Option<u16>> {
        self.get_as(alias, "Port")
    }
}

///////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use assertables::assert_contains;

    use super::supports_multiple;
    use crate::config::{Document, Error, Parser};

    fn parse(s: &str) -> Document {
        Parser::for_str(s, true).parse().unwrap()
    }

    #[test]
    fn defaults_without_host_block() {
        let doc = parse(
            r"
            Foo Bar
            Baz Qux
            # foop is a comment
        ",
        );
        assert_eq!(doc.get("any host", "foo"), "Bar");
        assert_eq!(doc.get("any host", "baz"), "Qux");
        assert_eq!(doc.get("any host", "foop"), "");
    }

    #[test]
    fn host_block_simple() {
        let doc = parse(
            r"
            Host Fred
            Foo Bar
            Host Barney
            Foo Baz
        ",
        );
        assert_eq!(doc.get("Fred", "foo"), "Bar");
        assert_eq!(doc.get("Barney", "foo"), "Baz");
        assert_eq!(doc.get("Wilma", "foo"), "");
    }

    #[test]
    fn earlier_match_wins() {
        let doc = parse(
            r"
            Host Fred
            Foo Bar
            Host Barney
            Foo Baz
            Host Fred
            Foo Qux
            Host *
            Foo Qix
        ",
        );
        assert_eq!(doc.get("Fred", "foo"), "Bar");
        assert_eq!(doc.get_all("Fred", "foo"), vec!["Bar"]);
        assert_eq!(doc.get("Dino", "foo"), "Qix");
    }

    #[test]
    fn later_default_works() {
        let doc = parse(
            r"
            Host Fred
            Foo Bar
            Host Barney
            Foo Baz
            Host *
            Qux Qix
        ",
        );
        assert_eq!(doc.get("Fred", "qux"), "Qix");
    }

    #[test]
    fn keys_are_case_insensitive() {
        let doc = parse("Host wap\n  User root\nHost *\n  User nobody\n");
        assert_eq!(doc.get("wap", "uSER"), doc.get("wap", "User"));
        assert_eq!(doc.get("wap", "USER"), "root");
    }

    #[test]
    fn cumulative_keys() {
        let doc = parse(
            r"
            Host has2identity
              IdentityFile f1
            Host nomatch
              IdentityFile nope
            Host has*
              IdentityFile f2
              User first
            Host *
              IdentityFile f3
              User second
        ",
        );
        assert!(supports_multiple("identityFILE"));
        assert!(!supports_multiple("User"));
        assert_eq!(doc.get_all("has2identity", "IdentityFile"), vec!["f1", "f2", "f3"]);
        assert_eq!(doc.get("has2identity", "IdentityFile"), "f1");
        assert_eq!(doc.get_all("has2identity", "User"), vec!["first"]);
        assert_eq!(doc.get_all("other", "IdentityFile"), vec!["f3"]);
    }

    #[test]
    fn match_blocks_are_never_selected() {
        let doc = parse("Match all\n  Port 4567\nHost *\n  Port 22\n");
        assert_eq!(doc.get("test.test", "Port"), "22");
    }

    #[test]
    fn quoting_and_splits() {
        let doc = parse(
            r#"Host admin
  XAuthLocation /usr/bin/xauth
  IdentityAgent ~/Library/Group Containers/x x x/agent.sock
  UserKnownHostsFile "~/.ssh/kh1" ~/.ssh/kh2 "~/.ssh/k h 3"
  SetEnv LC_A=1 LC_B="2 3" "LC_C=4 5 6"
  SetEnv = 'LC_D = 7 "8 9"'
Host comment
  Key1 "Value1 # This is part of the value, not a comment"
  Key2 Value2 # This is a comment
  User somebody#root#7e95b740
"#,
        );
        assert_eq!(doc.get("admin", "XAuthLocation"), "/usr/bin/xauth");
        assert_eq!(
            doc.get("admin", "IdentityAgent"),
            "~/Library/Group Containers/x x x/agent.sock"
        );
        assert_eq!(
            doc.get("admin", "UserKnownHostsFile"),
            r#""~/.ssh/kh1" ~/.ssh/kh2 "~/.ssh/k h 3""#
        );
        assert_eq!(
            doc.get_splits("admin", "UserKnownHostsFile"),
            vec!["~/.ssh/kh1", "~/.ssh/kh2", "~/.ssh/k h 3"]
        );
        assert_eq!(
            doc.get_all("admin", "SetEnv"),
            vec![r#"LC_A=1 LC_B="2 3" "LC_C=4 5 6""#, r#"LC_D = 7 "8 9""#]
        );
        assert_eq!(
            doc.get_all_splits("admin", "SetEnv"),
            vec!["LC_A=1", "LC_B=2 3", "LC_C=4 5 6", r#"LC_D = 7 "8 9""#]
        );
        assert_eq!(
            doc.get("comment", "Key1"),
            "Value1 # This is part of the value, not a comment"
        );
        assert_eq!(doc.get("comment", "Key2"), "Value2");
        assert_eq!(doc.get("comment", "User"), "somebody#root#7e95b740");
    }

    #[test]
    fn typed_values() {
        let doc = parse("Host good\n  Port 2222\nHost bad\n  Port notanumber\n");
        assert_eq!(doc.get_port("good").unwrap(), Some(2222));
        assert_eq!(doc.get_port("neither").unwrap(), None);
        let err = doc.get_port("bad").unwrap_err();
        assert!(matches!(err, Error::ValueConversion { .. }));
        assert_contains!(err.to_string(), "notanumber");

        let err = doc.get_strict("bad", "port").unwrap_err();
        assert_contains!(err.to_string(), "invalid digit");
        // non-numeric keys are not checked
        assert_eq!(doc.get_strict("bad", "User").unwrap(), "");

        // a stray carriage return at the end of the file is not part of the value
        let doc = parse("Host cr\n  Port 2200\r");
        assert_eq!(doc.get_port("cr").unwrap(), Some(2200));
    }

    #[test]
    fn include_inside_host_block() {
        let tempdir = tempfile::tempdir().unwrap();
        let inc = tempdir.path().join("inc");
        std::fs::write(&inc, "Port 4567\nHost other\n  User someone\n").unwrap();
        let doc = parse(&format!(
            "Host target\n  Include {inc:?}\nHost *\n  Port 22\n  User default\n"
        ));
        assert_eq!(doc.get("target", "Port"), "4567");
        assert_eq!(doc.get("elsewhere", "Port"), "22");
        assert_eq!(doc.get("target", "User"), "default");
    }

    #[test]
    fn include_at_top_level() {
        let tempdir = tempfile::tempdir().unwrap();
        let inc = tempdir.path().join("inc");
        std::fs::write(
            &inc,
            "Host kevinburke.ssh_config.test.example.com\n    Port 4567\n",
        )
        .unwrap();
        let doc = parse(&format!("Include {inc:?}\nHost *\n  Port 22\n"));
        assert_eq!(
            doc.get("kevinburke.ssh_config.test.example.com", "Port"),
            "4567"
        );
        assert_eq!(doc.get("other", "Port"), "22");
    }
}
