//! Client surface behavior: event delivery, subprotocol passthrough,
//! listener management, and terminal close semantics.

mod support;

use egret_client::{
    Client, ClientConfig, ClientError, ConnectionState, Event, EventKind, Message, TransportEvent,
};
use std::cell::RefCell;
use std::rc::Rc;
use support::{record_events, run_local, wait_for, ConnectOutcome, ScriptedProviders, ScriptedTransport};

#[test]
fn inbound_messages_dispatch_in_arrival_order() {
    run_local(|| async {
        let transport = ScriptedTransport::new(ConnectOutcome::Accept);
        let providers = ScriptedProviders::new(transport.clone());
        let client =
            Client::new(providers, "ws://test", ClientConfig::default()).expect("client");
        let messages = record_events(&client, &[EventKind::Message]);

        client.connect().expect("connect");
        wait_for(|| client.is_connected()).await;

        let server = transport.take_last_server().expect("connection");
        server
            .incoming
            .send(TransportEvent::Message(Message::from("one")))
            .expect("inject");
        server
            .incoming
            .send(TransportEvent::Message(Message::from("two")))
            .expect("inject");

        wait_for(|| messages.borrow().len() == 2).await;
        assert_eq!(
            *messages.borrow(),
            vec![
                Event::Message(Message::from("one")),
                Event::Message(Message::from("two")),
            ]
        );
        assert_eq!(client.metrics().messages_received, 2);
    });
}

#[test]
fn negotiated_subprotocol_is_surfaced_on_open() {
    run_local(|| async {
        let transport = ScriptedTransport::new(ConnectOutcome::Accept).with_subprotocol("chat");
        let providers = ScriptedProviders::new(transport.clone());
        let config = ClientConfig::default().with_protocols(["chat", "superchat"]);
        let client = Client::new(providers, "ws://test", config).expect("client");
        let opens = record_events(&client, &[EventKind::Open]);

        client.connect().expect("connect");
        wait_for(|| client.is_connected()).await;

        assert_eq!(
            *opens.borrow(),
            vec![Event::Open {
                subprotocol: Some("chat".to_owned())
            }]
        );
    });
}

#[test]
fn removed_listeners_stop_receiving_events() {
    run_local(|| async {
        let transport = ScriptedTransport::new(ConnectOutcome::Accept);
        let providers = ScriptedProviders::new(transport.clone());
        let client =
            Client::new(providers, "ws://test", ClientConfig::default()).expect("client");

        let seen = Rc::new(RefCell::new(Vec::new()));
        let keep = seen.clone();
        client.on(EventKind::Message, move |_| {
            keep.borrow_mut().push("keep");
        });
        let gone = seen.clone();
        let id = client.on(EventKind::Message, move |_| {
            gone.borrow_mut().push("gone");
        });
        assert!(client.off(EventKind::Message, id));

        client.connect().expect("connect");
        wait_for(|| client.is_connected()).await;
        let server = transport.take_last_server().expect("connection");
        server
            .incoming
            .send(TransportEvent::Message(Message::from("ping")))
            .expect("inject");

        wait_for(|| !seen.borrow().is_empty()).await;
        assert_eq!(*seen.borrow(), vec!["keep"]);
    });
}

#[test]
fn explicit_close_is_terminal_for_the_instance() {
    run_local(|| async {
        let transport = ScriptedTransport::new(ConnectOutcome::Accept);
        let providers = ScriptedProviders::new(transport.clone());
        let mut client =
            Client::new(providers, "ws://test", ClientConfig::default()).expect("client");
        let closes = record_events(&client, &[EventKind::Close]);

        client.connect().expect("connect");
        wait_for(|| client.is_connected()).await;
        let server = transport.take_last_server().expect("connection");

        client.close(Some(1000), Some("goodbye".to_owned())).await;

        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(server.closed.get());
        match closes.borrow().as_slice() {
            [Event::Close(close)] => {
                assert_eq!(close.code, Some(1000));
                assert_eq!(close.reason.as_deref(), Some("goodbye"));
                assert!(close.was_clean);
                assert!(!close.gave_up);
            }
            other => panic!("expected one clean close, got {other:?}"),
        }

        // No further operations are valid on a closed instance.
        assert!(matches!(
            client.connect(),
            Err(ClientError::InvalidState(_))
        ));
        assert!(matches!(
            client.send("late"),
            Err(ClientError::InvalidState(_))
        ));
    });
}

#[test]
fn invalid_configuration_is_rejected_at_construction() {
    run_local(|| async {
        let transport = ScriptedTransport::new(ConnectOutcome::Accept);
        let providers = ScriptedProviders::new(transport);
        let config = ClientConfig {
            retry_multiplier: 0.5,
            ..ClientConfig::default()
        };
        assert!(matches!(
            Client::new(providers, "ws://test", config),
            Err(ClientError::InvalidConfig(_))
        ));
    });
}
