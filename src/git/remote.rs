//! Remote URL parsing

/// Owner and repository name recovered from a remote URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    pub owner: String,
    pub name: String,
    pub url: String,
}

/// Parse `https://host/owner/name(.git)`, `ssh://git@host/owner/name.git`
/// and scp-style `git@host:owner/name.git`. The owner is the path segment
/// right before the name, so nested groups keep only their last segment.
pub fn parse_remote_url(url: &str) -> Option<RemoteUrl> {
    let trimmed = url.trim();
    let path = if let Some((_, rest)) = trimmed.split_once("://") {
        // drop host (and any user@ / :port)
        rest.split_once('/')?.1
    } else if let Some((host, rest)) = trimmed.split_once(':') {
        if host.contains('/') {
            return None;
        }
        rest
    } else {
        return None;
    };

    let mut segments = path
        .trim_end_matches('/')
        .trim_end_matches(".git")
        .rsplit('/')
        .filter(|s| !s.is_empty());
    let name = segments.next()?.to_string();
    let owner = segments.next()?.to_string();

    Some(RemoteUrl {
        owner,
        name,
        url: trimmed.to_string(),
    })
}
