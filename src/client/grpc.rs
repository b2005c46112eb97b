//! gRPC adapter: unary calls to three services sharing one channel

use super::{lazy::LazyConnection, ProtocolAdapter};
use crate::{
    error::{ClientError, InitializationError, RemoteCallError},
    models::{config::{timeout_of, GrpcConfig}, Collection, Record, Track, User},
    types::{Operation, Protocol},
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};

/// Wire messages of the user, music and playlist services
pub mod messages {
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Empty {}

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct ById {
        #[prost(int32, tag = "1")]
        pub id: i32,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct MusicRef {
        #[prost(int32, tag = "1")]
        pub music_id: i32,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct User {
        #[prost(int32, tag = "1")]
        pub id: i32,
        #[prost(string, tag = "2")]
        pub name: String,
        #[prost(int32, tag = "3")]
        pub age: i32,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Music {
        #[prost(int32, tag = "1")]
        pub id: i32,
        #[prost(string, tag = "2")]
        pub name: String,
        #[prost(string, tag = "3")]
        pub artist: String,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Playlist {
        #[prost(int32, tag = "1")]
        pub id: i32,
        #[prost(string, tag = "2")]
        pub name: String,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct UserList {
        #[prost(message, repeated, tag = "1")]
        pub users: Vec<User>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct MusicList {
        #[prost(message, repeated, tag = "1")]
        pub musics: Vec<Music>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct PlaylistList {
        #[prost(message, repeated, tag = "1")]
        pub playlists: Vec<Playlist>,
    }
}

use messages::{ById, Empty, MusicList, MusicRef, PlaylistList, UserList};

const USER_FIND_ALL: &str = "/user.UserService/FindAll";
const USER_FIND_PLAYLISTS: &str = "/user.UserService/FindPlaylists";
const MUSIC_FIND_ALL: &str = "/music.MusicService/FindAll";
const PLAYLIST_FIND_MUSICS: &str = "/playlist.PlaylistService/FindMusics";
const PLAYLIST_FIND_BY_MUSIC: &str = "/playlist.PlaylistService/FindByMusic";

/// Fully-qualified names of the services the client talks to
pub const SERVICES: [&str; 3] = ["user.UserService", "music.MusicService", "playlist.PlaylistService"];

/// Client stub for one service
#[derive(Clone)]
pub struct ServiceStub {
    service: &'static str,
    inner: Grpc<Channel>,
}

impl ServiceStub {
    pub fn new(service: &'static str, channel: Channel) -> Self {
        Self {
            service,
            inner: Grpc::new(channel),
        }
    }

    async fn unary<Req, Resp>(&self, path: &'static str, request: Req) -> Result<Resp, tonic::Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = self.inner.clone();
        grpc.ready()
            .await
            .map_err(|e| tonic::Status::unavailable(format!("{} not ready: {}", self.service, e)))?;

        let response = grpc
            .unary(
                tonic::Request::new(request),
                PathAndQuery::from_static(path),
                ProstCodec::<Req, Resp>::default(),
            )
            .await?;
        Ok(response.into_inner())
    }
}

/// The three stubs, sharing one channel
#[derive(Clone)]
pub struct GrpcStubs {
    pub user: ServiceStub,
    pub music: ServiceStub,
    pub playlist: ServiceStub,
}

impl GrpcStubs {
    pub fn from_channel(channel: Channel) -> Self {
        let [user, music, playlist] = SERVICES;
        Self {
            user: ServiceStub::new(user, channel.clone()),
            music: ServiceStub::new(music, channel.clone()),
            playlist: ServiceStub::new(playlist, channel),
        }
    }
}

/// Source of connected stubs
#[async_trait]
pub trait GrpcStubLoader: Send + Sync {
    async fn load(&self) -> Result<GrpcStubs, InitializationError>;
}

/// Opens a plaintext HTTP/2 channel to `host:port`
pub struct ChannelStubLoader {
    target: String,
    timeout: Duration,
}

impl ChannelStubLoader {
    pub fn new(config: &GrpcConfig) -> Self {
        Self {
            target: config.target.clone(),
            timeout: timeout_of(config.timeout_ms),
        }
    }

    pub fn endpoint(&self) -> Result<Endpoint, InitializationError> {
        Endpoint::from_shared(format!("http://{}", self.target))
            .map(|endpoint| endpoint.timeout(self.timeout).connect_timeout(self.timeout))
            .map_err(|e| InitializationError::new(Protocol::Grpc, format!("Invalid target '{}': {}", self.target, e)))
    }
}

#[async_trait]
impl GrpcStubLoader for ChannelStubLoader {
    async fn load(&self) -> Result<GrpcStubs, InitializationError> {
        tracing::info!(target = %self.target, services = ?SERVICES, "connecting gRPC channel");
        let channel = self.endpoint()?.connect().await.map_err(|e| {
            InitializationError::new(Protocol::Grpc, format!("Cannot connect to {}: {}", self.target, e))
        })?;
        Ok(GrpcStubs::from_channel(channel))
    }
}

pub struct GrpcAdapter {
    loader: Arc<dyn GrpcStubLoader>,
    connection: LazyConnection<GrpcStubs>,
}

impl GrpcAdapter {
    pub fn new(config: &GrpcConfig) -> Self {
        Self::with_loader(Arc::new(ChannelStubLoader::new(config)))
    }

    pub fn with_loader(loader: Arc<dyn GrpcStubLoader>) -> Self {
        Self {
            loader,
            connection: LazyConnection::new(Protocol::Grpc),
        }
    }

    async fn stubs(&self) -> Result<Arc<GrpcStubs>, InitializationError> {
        self.connection.get_or_init(|| self.loader.load()).await
    }
}

fn status_message(status: &tonic::Status) -> String {
    if status.message().is_empty() {
        format!("gRPC status {:?}", status.code())
    } else {
        format!("gRPC status {:?}: {}", status.code(), status.message())
    }
}

#[async_trait]
impl ProtocolAdapter for GrpcAdapter {
    fn protocol(&self) -> Protocol {
        Protocol::Grpc
    }

    async fn call(&self, operation: Operation) -> Result<Vec<Record>, ClientError> {
        let fail = |message: String| RemoteCallError::new(Protocol::Grpc, operation.name(), message);
        let id = match operation.argument() {
            Some(id) => i32::try_from(id).map_err(|_| fail(format!("Identifier {} does not fit in int32", id)))?,
            None => 0,
        };

        let stubs = self.stubs().await?;
        tracing::debug!(operation = operation.name(), "gRPC request");

        let records = match operation {
            Operation::ListUsers => stubs
                .user
                .unary::<_, UserList>(USER_FIND_ALL, Empty {})
                .await
                .map(|list| list.users.into_iter().map(Record::from).collect()),
            Operation::ListTracks => stubs
                .music
                .unary::<_, MusicList>(MUSIC_FIND_ALL, Empty {})
                .await
                .map(|list| list.musics.into_iter().map(Record::from).collect()),
            Operation::ListUserCollections { .. } => stubs
                .user
                .unary::<_, PlaylistList>(USER_FIND_PLAYLISTS, ById { id })
                .await
                .map(|list| list.playlists.into_iter().map(Record::from).collect()),
            Operation::ListCollectionItems { .. } => stubs
                .playlist
                .unary::<_, MusicList>(PLAYLIST_FIND_MUSICS, ById { id })
                .await
                .map(|list| list.musics.into_iter().map(Record::from).collect()),
            Operation::ListCollectionsByItem { .. } => stubs
                .playlist
                .unary::<_, PlaylistList>(PLAYLIST_FIND_BY_MUSIC, MusicRef { music_id: id })
                .await
                .map(|list| list.playlists.into_iter().map(Record::from).collect()),
        };

        Ok(records.map_err(|status| fail(status_message(&status)))?)
    }
}

impl From<messages::User> for Record {
    fn from(user: messages::User) -> Self {
        Record::User(User {
            id: user.id.into(),
            name: user.name,
            age: Some(user.age),
        })
    }
}

impl From<messages::Music> for Record {
    fn from(music: messages::Music) -> Self {
        Record::Track(Track {
            id: music.id.into(),
            name: music.name,
            artist: music.artist,
        })
    }
}

impl From<messages::Playlist> for Record {
    fn from(playlist: messages::Playlist) -> Self {
        Record::Collection(Collection {
            id: playlist.id.into(),
            name: playlist.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_messages_decode_into_records() {
        let list = UserList {
            users: vec![messages::User { id: 1, name: "Ana".to_string(), age: 30 }],
        };
        let decoded = UserList::decode(list.encode_to_vec().as_slice()).unwrap();
        let records: Vec<Record> = decoded.users.into_iter().map(Record::from).collect();
        assert_eq!(
            records,
            vec![Record::User(User { id: 1, name: "Ana".to_string(), age: Some(30) })]
        );
    }

    #[test]
    fn test_empty_repeated_field_is_empty() {
        let decoded = PlaylistList::decode(&[][..]).unwrap();
        assert!(decoded.playlists.is_empty());
    }

    #[test]
    fn test_invalid_target_rejected() {
        let loader = ChannelStubLoader::new(&GrpcConfig {
            target: "bad host:50051".to_string(),
            timeout_ms: 1000,
        });
        assert!(loader.endpoint().is_err());
    }

    #[tokio::test]
    async fn test_identifier_out_of_int32_range() {
        let adapter = GrpcAdapter::new(&GrpcConfig {
            target: "127.0.0.1:1".to_string(),
            timeout_ms: 200,
        });
        let err = adapter
            .call(Operation::ListUserCollections { user_id: i64::from(i32::MAX) + 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::RemoteCall(ref e) if e.message.contains("int32")));
        assert!(!adapter.connection.is_ready().await);
    }
}
