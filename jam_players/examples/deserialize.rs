use jam_players::clients::IClient;

fn main() {
    let data = jam_players::clients::SampleClient::default()
        .fetch()
        .unwrap();
    let mut roster = jam_players::Roster::new();
    roster.import(jam_players::deserialize(&data).unwrap());
    for user in roster.users() {
        println!("{:?} {:?} {:?}", user.name, user.instruments, user.status);
    }
}
