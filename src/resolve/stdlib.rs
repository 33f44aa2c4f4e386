use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Import paths of the language's standard library. These never become
/// dependency edges.
static STDLIB: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "crypto/hmac",
        "crypto/md5",
        "crypto/sha1",
        "crypto/sha256",
        "crypto/sha512",
        "encoding/base64",
        "encoding/binary",
        "encoding/csv",
        "encoding/hex",
        "encoding/json",
        "encoding/pem",
        "encoding/yaml",
        "html",
        "io",
        "list",
        "math",
        "math/bits",
        "math/rand",
        "net",
        "net/url",
        "path",
        "path/filepath",
        "regexp",
        "strconv",
        "strings",
        "struct",
        "text/tabwriter",
        "text/template",
        "time",
        "tool",
        "tool/cli",
        "tool/exec",
        "tool/file",
        "tool/http",
        "tool/os",
        "uuid",
    ]
    .into_iter()
    .collect()
});

pub fn is_stdlib(import: &str) -> bool {
    STDLIB.contains(import)
}
