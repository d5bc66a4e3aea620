use super::Network;

pub(crate) fn twitter() -> Network {
    Network {
        name: "Twitter".to_owned(),
        url: "http://twitter.com/".to_owned(),
        identifier: "twitter".to_owned(),
        icon: None,
    }
}
