use serde::{Deserialize, Serialize};

/// One row of the votes file: `username,fullname,vote`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRecord {
    pub username: String,
    pub fullname: String,
    pub vote: String,
}

impl VoteRecord {
    pub fn new(
        username: impl Into<String>,
        fullname: impl Into<String>,
        vote: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            fullname: fullname.into(),
            vote: vote.into(),
        }
    }

    /// Builds a record from the raw fields of one input row.
    pub fn from_fields<'a, I>(fields: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut fields = fields.into_iter();
        let (Some(username), Some(fullname), Some(vote)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err("expected username,fullname,vote".to_string());
        };

        if fullname.is_empty() {
            return Err("empty post fullname".to_string());
        }

        Ok(Self::new(username, fullname, vote))
    }
}

/// One row of the output file. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostInfo {
    pub username: String,
    pub vote: String,
    pub subreddit: String,
    pub title: String,
    pub content: String,
}

impl PostInfo {
    pub fn from_vote(
        record: &VoteRecord,
        subreddit: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            username: record.username.clone(),
            vote: record.vote.clone(),
            subreddit: subreddit.into(),
            title: title.into(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_fields() {
        let record = VoteRecord::from_fields(["alice", "t3_abc", "1"]).unwrap();
        assert_eq!(record, VoteRecord::new("alice", "t3_abc", "1"));
    }

    #[test]
    fn test_record_ignores_extra_fields() {
        let record = VoteRecord::from_fields(["alice", "t3_abc", "-1", "extra"]).unwrap();
        assert_eq!(record.vote, "-1");
    }

    #[test]
    fn test_record_rejects_short_rows() {
        assert!(VoteRecord::from_fields(["alice", "t3_abc"]).is_err());
        assert!(VoteRecord::from_fields(["alice", "", "1"]).is_err());
    }

    #[test]
    fn test_post_info_keeps_vote_fields() {
        let record = VoteRecord::new("bob", "t3_x", "-1");
        let info = PostInfo::from_vote(&record, "rust", "Title", "Body");
        assert_eq!(info.username, "bob");
        assert_eq!(info.vote, "-1");
        assert_eq!(info.subreddit, "rust");
    }
}
